mod collab;
mod env;

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    Json, Router,
    extract::{
        ConnectInfo, Query, State, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    http::HeaderMap,
    response::IntoResponse,
    routing::get,
};
use dashmap::DashMap;
use futures_util::{SinkExt, stream::StreamExt};
use serde_json::json;
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use duel_patti_core::{
    Audience, Authenticator, Connection, ConnectionId, Dispatch, GameTable, Handshake, ServerMessage,
};

use crate::collab::{ChannelLedger, RoundBus, TokenAuthenticator};
use crate::env::ServerConfig;

// 服务器全局状态
struct AppState {
    table: GameTable,
    auth: Box<dyn Authenticator>,
    // 房间内所有已激活的连接，用于广播
    connections: DashMap<ConnectionId, mpsc::Sender<ServerMessage>>,
}

type SharedState = Arc<AppState>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ServerConfig::from_env();

    let bus = RoundBus::new(1024);
    let mut bus_rx = bus.subscribe();
    tokio::spawn(async move {
        // 跨进程通知的出口，目前只记录日志
        while let Ok(result) = bus_rx.recv().await {
            info!(target: "bus", "第 {} 局已开出，胜者 {}", result.round_id, result.winner);
        }
    });

    let table = GameTable::new(
        config.game.clone(),
        Arc::new(ChannelLedger::spawn()),
        Arc::new(bus),
    )
    .context("无效的牌桌配置")?;

    let state = SharedState::new(AppState {
        table,
        auth: Box::new(TokenAuthenticator::new(config.auth_tokens.clone())),
        connections: DashMap::new(),
    });

    let app = Router::new()
        .route("/", get(health_handler))
        .route("/ws", get(websocket_handler))
        .with_state(state.clone());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("无效的监听地址")?;
    info!("服务器正在监听 {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal(state))
        .await?;
    Ok(())
}

/// 收到 Ctrl-C 后锁桌，不再受理新的下注
async fn shutdown_signal(state: SharedState) {
    if tokio::signal::ctrl_c().await.is_err() {
        warn!("无法监听关闭信号");
        std::future::pending::<()>().await;
    }
    state.table.close();
    info!("服务器正在关闭");
}

async fn health_handler() -> impl IntoResponse {
    Json(json!({
        "statusCode": 200,
        "message": "two card duel is up and running",
    }))
}

/// 处理 WebSocket 连接请求
async fn websocket_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    State(state): State<SharedState>,
) -> impl IntoResponse {
    let forwarded_for = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok());
    let handshake = Handshake {
        token: params.get("token").cloned(),
        game_id: params.get("game_id").cloned(),
        ip: Handshake::client_ip(forwarded_for, &peer.ip().to_string()),
    };
    ws.on_upgrade(move |socket| handle_socket(socket, handshake, state))
}

/// 处理单个 WebSocket 连接的生命周期
async fn handle_socket(socket: WebSocket, handshake: Handshake, state: SharedState) {
    let (mut sender, mut receiver) = socket.split();
    let mut conn = Connection::new(handshake);
    let conn_id = conn.id();

    // 鉴权失败: 回一个错误帧后直接关闭
    if let Err(err) = conn.authenticate(state.auth.as_ref()) {
        if let Ok(payload) = serde_json::to_string(&ServerMessage::error(err)) {
            let _ = sender.send(Message::Text(payload.into())).await;
        }
        let _ = sender.send(Message::Close(None)).await;
        return;
    }

    // 创建一个 MPSC 通道，用于从其他任务接收要发送的消息
    let (tx, mut rx) = mpsc::channel::<ServerMessage>(32);

    // 启动一个新任务，专门负责将 MPSC 通道中的消息发送到 WebSocket
    let write_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            let payload = match serde_json::to_string(&msg) {
                Ok(payload) => payload,
                Err(e) => {
                    warn!("序列化消息失败: {}", e);
                    continue;
                }
            };
            if sender.send(Message::Text(payload.into())).await.is_err() {
                // 发送失败，说明客户端已断开，退出任务
                break;
            }
        }
    });

    match conn.activate(&state.table) {
        Ok(replay) => {
            state.connections.insert(conn_id, tx.clone());
            deliver(replay, &state, &tx).await;
        }
        Err(err) => {
            warn!("连接 {} 激活失败: {}", conn_id, err);
            write_task.abort();
            return;
        }
    }
    info!("连接 {} 已加入房间，当前在线 {}", conn_id, state.connections.len());

    // 主循环，处理从客户端接收到的消息
    while let Some(msg) = receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                let dispatches = conn.handle_frame(text.as_str(), &state.table);
                deliver(dispatches, &state, &tx).await;
            }
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                warn!("连接 {} 传输出错: {}", conn_id, e);
                break;
            }
        }
    }

    // 客户端断开连接，执行清理工作
    state.connections.remove(&conn_id);
    conn.disconnect();
    write_task.abort();
}

/// 按接收方投递协议处理器产生的消息
async fn deliver(dispatches: Vec<Dispatch>, state: &AppState, tx: &mpsc::Sender<ServerMessage>) {
    for dispatch in dispatches {
        match dispatch.audience {
            Audience::Sender => {
                let _ = tx.send(dispatch.message).await;
            }
            Audience::Room => broadcast(state, &dispatch.message).await,
        }
    }
}

/// 向房间内所有连接广播消息
async fn broadcast(state: &AppState, message: &ServerMessage) {
    // 先复制出发送端，避免在 await 期间持有 DashMap 的引用
    let targets: Vec<(ConnectionId, mpsc::Sender<ServerMessage>)> = state
        .connections
        .iter()
        .map(|entry| (*entry.key(), entry.value().clone()))
        .collect();

    for (conn_id, sender) in targets {
        if sender.send(message.clone()).await.is_err() {
            // 发送失败，说明该连接也断开了，后续由其自己的 handle_socket 任务处理
            warn!("向连接 {} 发送消息失败（可能已断开）", conn_id);
        }
    }
}
