use chrono::Utc;
use duel_patti_core::*;

fn result(round_id: RoundId, hand1: &[&str], hand2: &[&str]) -> RoundResult {
    let (hand1, hand2) = (Hand::parse(hand1).unwrap(), Hand::parse(hand2).unwrap());
    RoundResult {
        round_id,
        hand1,
        hand2,
        winner: compare_hands(&hand1, &hand2),
        created_at: Utc::now(),
    }
}

fn outcome_for(chip: Side, stake: i64, winner: Side) -> SettlementOutcome {
    let mut round = result(1, &["10-S", "10-D"], &["3-H", "4-H"]);
    round.winner = winner;
    let wager = Wager { chip, stake: Amount::from_major(stake), bettor_id: "bettor".into(), round_id: 1 };
    settle(&wager, &round, &PayoutConfig::default())
}

#[test]
fn trio_beats_pure_sequence() {
    assert_eq!(rank_cards(&["10-S", "10-D"], &["3-H", "4-H"]), Ok(Side::Player1));
    assert_eq!(result(1, &["10-S", "10-D"], &["3-H", "4-H"]).winner, Side::Player1);
}

#[test]
fn matching_chip_pays_win_multiplier() {
    let outcome = outcome_for(Side::Player1, 100, Side::Player1);
    assert_eq!(outcome.status, BetStatus::Win);
    assert_eq!(outcome.multiplier.to_string(), "1.98");
    assert_eq!(outcome.payout, Amount::from_major(198));
}

#[test]
fn tie_chip_on_tie_pays_tie_multiplier() {
    let outcome = outcome_for(Side::Tie, 100, Side::Tie);
    assert_eq!(outcome.status, BetStatus::Win);
    assert_eq!(outcome.multiplier.to_string(), "0.50");
    assert_eq!(outcome.payout, Amount::from_major(50));
}

#[test]
fn wrong_chip_loses_everything() {
    let outcome = outcome_for(Side::Player2, 50, Side::Player1);
    assert_eq!(outcome.status, BetStatus::Loss);
    assert_eq!(outcome.payout, Amount::ZERO);
    assert_eq!(outcome.stake, Amount::from_major(50));
}

#[test]
fn history_keeps_last_three_in_order() {
    let mut history = RoundHistory::default();
    let rounds: Vec<_> = (1..=4).map(|id| result(id, &["2-S", "9-D"], &["K-H", "J-C"])).collect();
    for round in &rounds {
        history.record(round.clone());
    }
    assert_eq!(history.snapshot(), rounds[1..].to_vec());
}

#[test]
fn settle_is_repeatable() {
    let round = result(3, &["A-S", "2-H"], &["Q-D", "K-D"]);
    let wager = Wager { chip: Side::Player2, stake: Amount::from_minor(1234), bettor_id: "b".into(), round_id: 3 };
    let first = settle(&wager, &round, &PayoutConfig::default());
    let second = settle(&wager, &round, &PayoutConfig::default());
    assert_eq!(first, second);
    assert_eq!(serde_json::to_string(&first).unwrap(), serde_json::to_string(&second).unwrap());
}

#[test]
fn full_session_over_the_wire_protocol() {
    let table = GameTable::standalone(GameConfig { seed: Some(2024), ..GameConfig::default() }).unwrap();

    let mut alice = Connection::new(Handshake { ip: "10.0.0.1".into(), ..Handshake::default() });
    alice.authenticate(&AllowAll).unwrap();
    alice.activate(&table).unwrap();

    for _ in 0..4 {
        let out = alice.handle_frame("BT:100:1", &table);
        assert_eq!(out[0].message.event_name(), "bet_result");
    }

    // 后加入的连接只看到最近三局
    let mut bob = Connection::new(Handshake { ip: "10.0.0.2".into(), ..Handshake::default() });
    bob.authenticate(&AllowAll).unwrap();
    let replay = bob.activate(&table).unwrap();
    match &replay[0].message {
        ServerMessage::LastRounds { rounds } => {
            let ids: Vec<_> = rounds.iter().map(|r| r.round_id).collect();
            assert_eq!(ids, vec![2, 3, 4]);
        }
        other => panic!("unexpected replay {:?}", other),
    }

    alice.disconnect();
    assert_eq!(table.last_rounds().len(), 3);
}
