use lob_microstructure::orderbook::{OrderBook, Side};
use proptest::prelude::*;

/// Prices on a half-tick grid; bids below 100, asks from 100.5 up.
fn bid_price() -> impl Strategy<Value = f64> {
    (160u32..200).prop_map(|ticks| f64::from(ticks) * 0.5)
}

fn ask_price() -> impl Strategy<Value = f64> {
    (201u32..240).prop_map(|ticks| f64::from(ticks) * 0.5)
}

/// Zero is drawn often enough to exercise removals.
fn quantity() -> impl Strategy<Value = f64> {
    prop_oneof![
        1 => Just(0.0),
        4 => (1u32..1_000).prop_map(|q| f64::from(q) / 10.0),
    ]
}

fn side() -> impl Strategy<Value = Side> {
    prop_oneof![Just(Side::Bid), Just(Side::Ask)]
}

/// Any level on either side, crossing allowed.
fn any_update() -> impl Strategy<Value = (Side, f64, f64)> {
    (side(), (150u32..250).prop_map(|t| f64::from(t) * 0.5), quantity())
}

/// Updates that keep bids and asks on their own side of 100.25.
fn uncrossing_updates(max: usize) -> impl Strategy<Value = Vec<(Side, f64, f64)>> {
    proptest::collection::vec(
        prop_oneof![
            (bid_price(), quantity()).prop_map(|(p, q)| (Side::Bid, p, q)),
            (ask_price(), quantity()).prop_map(|(p, q)| (Side::Ask, p, q)),
        ],
        0..max,
    )
}

fn apply(book: &mut OrderBook, updates: &[(Side, f64, f64)]) {
    for &(side, price, quantity) in updates {
        book.update_level(side, price, quantity).unwrap();
    }
}

proptest! {
    #[test]
    fn depth_never_exceeds_max(
        max_depth in 1usize..8,
        updates in proptest::collection::vec(any_update(), 0..200),
    ) {
        let mut book = OrderBook::new(max_depth);
        for (side, price, quantity) in updates {
            book.update_level(side, price, quantity).unwrap();
            prop_assert!(book.len(Side::Bid) <= max_depth);
            prop_assert!(book.len(Side::Ask) <= max_depth);
        }
    }

    #[test]
    fn repeated_update_is_idempotent(
        max_depth in 1usize..10,
        history in uncrossing_updates(60),
        (side, price, quantity) in prop_oneof![
            (bid_price(), quantity()).prop_map(|(p, q)| (Side::Bid, p, q)),
            (ask_price(), quantity()).prop_map(|(p, q)| (Side::Ask, p, q)),
        ],
    ) {
        let mut book = OrderBook::new(max_depth);
        apply(&mut book, &history);

        book.update_level(side, price, quantity).unwrap();
        let once = book.snapshot();
        book.update_level(side, price, quantity).unwrap();

        prop_assert_eq!(book.snapshot(), once);
    }

    #[test]
    fn aggressive_ask_never_leaves_book_crossed(
        max_depth in 1usize..10,
        history in uncrossing_updates(60),
        ask_ticks in 150u32..250,
        quantity in 1u32..100,
    ) {
        let mut book = OrderBook::new(max_depth);
        apply(&mut book, &history);

        book.update_level(Side::Ask, f64::from(ask_ticks) * 0.5, f64::from(quantity)).unwrap();

        if let (Some(bid), Some(ask)) = (book.best_bid(), book.best_ask()) {
            prop_assert!(bid < ask, "crossed: bid {} >= ask {}", bid, ask);
        }
    }

    #[test]
    fn single_cross_from_bid_is_resolved(
        max_depth in 1usize..10,
        history in uncrossing_updates(60),
        bid_ticks in 150u32..250,
        quantity in 1u32..100,
    ) {
        let mut book = OrderBook::new(max_depth);
        apply(&mut book, &history);

        let price = f64::from(bid_ticks) * 0.5;
        let asks = book.depth(2).asks;
        let crosses_once = asks.get(1).is_none_or(|second| price < second.price);

        book.update_level(Side::Bid, price, f64::from(quantity)).unwrap();

        if crosses_once {
            if let (Some(bid), Some(ask)) = (book.best_bid(), book.best_ask()) {
                prop_assert!(bid < ask, "crossed: bid {} >= ask {}", bid, ask);
            }
        }
    }
}
