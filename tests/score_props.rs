use blackjack_env::{is_bust, score, Shoe};
use proptest::prelude::*;

fn hand_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(1u8..=10, 1..12)
}

proptest! {
    #[test]
    fn usable_ace_never_busts(hand in hand_strategy()) {
        let (total, usable_ace) = score(&hand);
        if usable_ace {
            prop_assert!(total <= 21);
            prop_assert!(!is_bust(&hand));
        }
    }

    #[test]
    fn ace_promoted_at_most_once(hand in hand_strategy()) {
        let sum: u8 = hand.iter().sum();
        let (total, usable_ace) = score(&hand);
        let expected_soft = hand.contains(&1) && sum + 10 <= 21;
        prop_assert_eq!(usable_ace, expected_soft);
        prop_assert_eq!(total, if usable_ace { sum + 10 } else { sum });
    }

    #[test]
    fn score_ignores_card_order(mut hand in hand_strategy()) {
        let before = score(&hand);
        hand.reverse();
        prop_assert_eq!(score(&hand), before);
    }

    #[test]
    fn drawing_shrinks_fresh_shoe(seed in any::<u64>(), draws in 0usize..=312) {
        let mut shoe = Shoe::seeded(6, seed);
        let size = shoe.remaining_cards();
        for _ in 0..draws {
            let card = shoe.draw();
            prop_assert!((1..=10).contains(&card));
        }
        prop_assert_eq!(shoe.remaining_cards(), size - draws);
    }
}
