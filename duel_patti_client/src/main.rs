use futures_util::{SinkExt, StreamExt};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message};
use url::Url;

use duel_patti_core::{Amount, BetRequest, ChipBet, ClientMessage, ServerMessage, Side};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut url = Url::parse(
        &std::env::args().nth(1).unwrap_or_else(|| "ws://127.0.0.1:25917/ws".to_string()),
    )?;
    if let Ok(token) = std::env::var("DUEL_TOKEN") {
        url.query_pairs_mut().append_pair("token", &token);
    }

    println!("正在连接到: {}", url);
    let (ws_stream, _) = connect_async(url.as_str()).await?;
    println!("连接成功!");

    let (mut write, mut read) = ws_stream.split();

    // 启动一个任务来处理从服务器接收的消息
    tokio::spawn(async move {
        while let Some(msg) = read.next().await {
            match msg {
                Ok(Message::Text(text)) => {
                    match serde_json::from_str::<ServerMessage>(&text) {
                        Ok(server_msg) => {
                            println!("\n<-- [{}]", server_msg.event_name());
                            print_message(&server_msg);
                            print!("> "); // 重新显示输入提示符
                            let _ = std::io::stdout().flush();
                        }
                        Err(e) => eprintln!("解析服务器消息失败: {}", e),
                    }
                }
                Ok(Message::Close(_)) => {
                    println!("\n服务器关闭了连接");
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    eprintln!("接收消息时出错: {}", e);
                    break;
                }
            }
        }
    });

    // 主任务处理用户输入
    let mut stdin = BufReader::new(tokio::io::stdin()).lines();

    println!("--- 两张牌对决客户端 ---");
    println!("可用命令:");
    println!("  bet <金额> <1|2|3> [<金额> <1|2|3>...] [局号]");
    println!("                            - 下注 (1=玩家1, 2=玩家2, 3=平局)，同一局可押多个位置");
    println!("  round                     - 请求开一局");
    println!("  raw <文本帧>              - 直接发送原始帧，例如 BT:100:1");
    println!("  exit                      - 退出");

    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let line = match stdin.next_line().await? {
            Some(line) => line,
            None => break,
        };
        let parts: Vec<&str> = line.split_whitespace().collect();

        let frame = match parts.first().copied() {
            Some("bet") => match parse_bet(&parts[1..]) {
                Ok(request) => ClientMessage::PlaceBet(request).to_frame(),
                Err(usage) => {
                    println!("{}", usage);
                    continue;
                }
            },
            Some("round") => ClientMessage::RequestRound.to_frame(),
            Some("raw") => parts[1..].join(" "),
            Some("exit") => {
                println!("正在断开连接...");
                break;
            }
            None => continue,
            _ => {
                println!("未知命令: {}", line);
                continue;
            }
        };

        write.send(Message::Text(frame.into())).await?;
    }

    let _ = write.send(Message::Close(None)).await;
    Ok(())
}

fn parse_bet(args: &[&str]) -> Result<BetRequest, String> {
    const USAGE: &str = "用法: bet <金额> <1|2|3> [<金额> <1|2|3>...] [局号]";
    let mut pairs = args.chunks_exact(2);
    let mut bets = Vec::new();
    for pair in pairs.by_ref() {
        let stake: Amount = pair[0].parse().map_err(|e| format!("{} ({})", USAGE, e))?;
        let chip: Side = pair[1].parse().map_err(|e| format!("{} ({})", USAGE, e))?;
        bets.push(ChipBet { stake, chip });
    }
    if bets.is_empty() {
        return Err(USAGE.to_string());
    }
    // 落单的最后一个参数是局号
    let round_id = match pairs.remainder() {
        [raw] => Some(raw.parse().map_err(|_| format!("{} (无效的局号)", USAGE))?),
        _ => None,
    };
    Ok(BetRequest { bets, round_id })
}

fn print_message(msg: &ServerMessage) {
    match msg {
        ServerMessage::BetResult { result, settlements, .. } => {
            println!(
                "第 {} 局: 玩家1 [{}] vs 玩家2 [{}] -> {}",
                result.round_id, result.hand1, result.hand2, result.winner
            );
            if let Some(hand) = result.winning_hand() {
                println!("胜方手牌: {}", hand);
            }
            for settlement in settlements {
                println!(
                    "押 {} 本金 {}: {:?}，赔率 {}，派彩 {}",
                    settlement.chip, settlement.stake, settlement.status, settlement.multiplier, settlement.payout
                );
            }
        }
        ServerMessage::RoundResult { result, categories } | ServerMessage::Round { result, categories } => {
            println!(
                "第 {} 局: 玩家1 [{}]({}) vs 玩家2 [{}]({}) -> {}",
                result.round_id, result.hand1, categories[0], result.hand2, categories[1], result.winner
            );
        }
        ServerMessage::LastRounds { rounds } => {
            for result in rounds {
                println!("  #{} {} vs {} -> {}", result.round_id, result.hand1, result.hand2, result.winner);
            }
        }
        ServerMessage::BetError { code, message } | ServerMessage::Error { code, message } => {
            println!("[{}] {}", code, message);
        }
    }
}
