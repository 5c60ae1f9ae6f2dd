use duel_patti_core::*;
use proptest::prelude::*;

fn card() -> impl Strategy<Value = Card> {
    (0..VALUES.len(), 0..SUITS.len()).prop_map(|(v, s)| Card::new(VALUES[v], SUITS[s]))
}

fn hand() -> impl Strategy<Value = Hand> {
    (card(), card())
        .prop_filter("a hand never holds the same card twice", |(a, b)| a != b)
        .prop_map(|(a, b)| Hand::new(a, b))
}

fn side() -> impl Strategy<Value = Side> {
    prop_oneof![Just(Side::Player1), Just(Side::Player2), Just(Side::Tie)]
}

proptest! {
    #[test]
    fn ranking_is_antisymmetric(h1 in hand(), h2 in hand()) {
        prop_assert_eq!(compare_hands(&h1, &h2), compare_hands(&h2, &h1).swapped());
    }

    #[test]
    fn ranking_ignores_card_order(h in hand(), other in hand()) {
        let [a, b] = *h.cards();
        prop_assert_eq!(compare_hands(&h, &other), compare_hands(&Hand::new(b, a), &other));
    }

    #[test]
    fn better_category_always_wins(h1 in hand(), h2 in hand()) {
        let (r1, r2) = (evaluate(&h1), evaluate(&h2));
        if r1.category > r2.category {
            prop_assert_eq!(compare_hands(&h1, &h2), Side::Player1);
        }
    }

    #[test]
    fn wrap_pairs_are_never_high_card(s1 in 0..SUITS.len(), s2 in 0..SUITS.len()) {
        for (a, b) in [(Value::Queen, Value::King), (Value::Ace, Value::Two)] {
            let rank = evaluate(&Hand::new(Card::new(a, SUITS[s1]), Card::new(b, SUITS[s2])));
            prop_assert!(matches!(rank.category, HandCategory::Sequence | HandCategory::PureSequence));
        }
    }

    #[test]
    fn payout_never_exceeds_ceiling(
        stake in 1i64..i64::MAX,
        ceiling in 1i64..1_000_000_000,
        chip in side(),
        winner in side(),
    ) {
        let payout = PayoutConfig { max_cashout: Amount::from_minor(ceiling), ..PayoutConfig::default() };
        let round = RoundResult {
            round_id: 1,
            hand1: Hand::parse(&["2-S", "9-D"]).unwrap(),
            hand2: Hand::parse(&["K-H", "J-C"]).unwrap(),
            winner,
            created_at: chrono::Utc::now(),
        };
        let wager = Wager { chip, stake: Amount::from_minor(stake), bettor_id: "p".into(), round_id: 1 };
        let outcome = settle(&wager, &round, &payout);
        prop_assert!(outcome.payout <= payout.max_cashout);
        prop_assert!(outcome.payout >= Amount::ZERO);
    }
}
