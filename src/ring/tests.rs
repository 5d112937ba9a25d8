//! Hash Ring Tests
//!
//! Validates placement, replica-set selection and the movement bound of the ring.
//!
//! ## Test Scopes
//! - **Addresses & Positions**: Parsing of `host:port`, digest ordering.
//! - **Membership**: Idempotent insert/remove, exact restoration of the position set.
//! - **Lookup**: Ordering, wrap-around, inclusive bound, no duplicates, empty ring.
//! - **Rebalancing**: Adding a node only moves keys onto that node.

#[cfg(test)]
mod tests {
    use crate::ring::hashring::HashRing;
    use crate::ring::types::{NodeAddr, ReplicaSet, RingPosition, VirtualNode};
    use rand::Rng;
    use std::collections::HashSet;

    fn addr(port: u16) -> NodeAddr {
        NodeAddr::new("127.0.0.1", port)
    }

    /// A = 5001, B = 5002, C = 5003.
    fn abc_ring() -> HashRing {
        let mut ring = HashRing::new(3);
        for port in [5001, 5002, 5003] {
            ring.insert(&addr(port));
        }
        ring
    }

    // ============================================================
    // ADDRESS & POSITION TESTS
    // ============================================================

    #[test]
    fn test_node_addr_roundtrip_display() {
        let parsed: NodeAddr = "10.1.2.3:7000".parse().unwrap();
        assert_eq!(parsed, NodeAddr::new("10.1.2.3", 7000));
        assert_eq!(parsed.to_string(), "10.1.2.3:7000");
    }

    #[test]
    fn test_node_addr_rejects_garbage() {
        assert!("no-port".parse::<NodeAddr>().is_err());
        assert!("host:99999".parse::<NodeAddr>().is_err());
        assert!(":5000".parse::<NodeAddr>().is_err());
        assert!(NodeAddr::from_parts("localhost", "abc").is_err());
    }

    #[test]
    fn test_node_addr_list_parsing() {
        let list = NodeAddr::parse_list("127.0.0.1:5002,127.0.0.1:5003").unwrap();
        assert_eq!(list, vec![addr(5002), addr(5003)]);
        assert_eq!(NodeAddr::join_list(&list), "127.0.0.1:5002,127.0.0.1:5003");
        assert!(NodeAddr::parse_list("127.0.0.1:5002,bogus").is_err());
    }

    #[test]
    fn test_node_addr_orders_ports_numerically() {
        let mut addrs = vec![addr(10000), addr(9000), NodeAddr::new("10.0.0.1", 1)];
        addrs.sort();
        assert_eq!(
            addrs,
            vec![NodeAddr::new("10.0.0.1", 1), addr(9000), addr(10000)]
        );
    }

    #[test]
    fn test_position_is_sha256_of_label() {
        let vnode = VirtualNode::new(addr(5002), 0);
        assert_eq!(vnode.label(), "127.0.0.1:5002:0");

        let position = vnode.position();
        assert_eq!(&position.as_bytes()[..4], &[0x7a, 0xf4, 0x3e, 0xf8]);
        assert_eq!(position, RingPosition::of("127.0.0.1:5002:0"));
        assert!(RingPosition::MIN <= position);
    }

    // ============================================================
    // MEMBERSHIP TESTS
    // ============================================================

    #[test]
    fn test_insert_is_idempotent() {
        let mut ring = HashRing::new(3);
        assert!(ring.insert(&addr(5001)));
        let before = ring.positions();

        assert!(!ring.insert(&addr(5001)));
        assert_eq!(ring.positions(), before);
        assert_eq!(ring.positions().len(), 3);
        assert_eq!(ring.len(), 1);
    }

    #[test]
    fn test_insert_then_remove_restores_positions() {
        let mut ring = abc_ring();
        let before = ring.positions();

        let newcomer = addr(6000);
        ring.insert(&newcomer);
        assert_eq!(ring.positions().len(), before.len() + 3);

        assert!(ring.remove(&newcomer));
        assert_eq!(ring.positions(), before);
        assert!(!ring.contains(&newcomer));
    }

    #[test]
    fn test_remove_absent_node_is_noop() {
        let mut ring = abc_ring();
        let before = ring.positions();

        assert!(!ring.remove(&addr(9999)));
        assert_eq!(ring.positions(), before);
    }

    #[test]
    fn test_nodes_are_listed_in_address_order() {
        let mut ring = HashRing::new(3);
        ring.insert(&addr(5003));
        ring.insert(&addr(5001));
        ring.insert(&addr(5002));

        assert_eq!(ring.nodes(), vec![addr(5001), addr(5002), addr(5003)]);
    }

    #[test]
    fn test_positions_are_sorted() {
        let ring = abc_ring();
        let positions = ring.positions();
        assert!(positions.windows(2).all(|pair| pair[0].0 <= pair[1].0));
    }

    // ============================================================
    // LOOKUP TESTS
    // ============================================================

    #[test]
    fn test_lookup_on_empty_ring_is_empty() {
        let ring = HashRing::new(3);
        let set = ring.lookup("user:100", 3);
        assert!(set.is_empty());
        assert!(set.primary().is_none());
    }

    #[test]
    fn test_lookup_scenario_user_100() {
        let ring = abc_ring();
        let expected = ReplicaSet::new(vec![addr(5002), addr(5003), addr(5001)]);

        for _ in 0..10 {
            assert_eq!(ring.lookup("user:100", 3), expected);
        }

        let set = ring.lookup("user:100", 3);
        assert_eq!(set.primary(), Some(&addr(5002)));
        assert_eq!(set.replicas(), &[addr(5003), addr(5001)]);
    }

    #[test]
    fn test_lookup_wraps_around_the_top() {
        // sha256("wrap-16") is above every position of the A/B/C ring.
        let ring = abc_ring();
        let top = ring.positions().last().unwrap().0;
        assert!(RingPosition::of("wrap-16") > top);

        let set = ring.lookup("wrap-16", 3);
        assert_eq!(set.nodes(), &[addr(5003), addr(5001), addr(5002)]);
    }

    #[test]
    fn test_lookup_bound_is_inclusive() {
        // A key hashing exactly onto B's first virtual node is owned by B.
        let ring = abc_ring();
        let set = ring.lookup("127.0.0.1:5002:0", 1);
        assert_eq!(set.nodes(), &[addr(5002)]);
    }

    #[test]
    fn test_lookup_never_pads_or_duplicates() {
        let mut ring = HashRing::new(3);
        ring.insert(&addr(5001));
        assert_eq!(ring.lookup("user:100", 3).nodes(), &[addr(5001)]);

        ring.insert(&addr(5002));
        assert_eq!(
            ring.lookup("user:100", 3).nodes(),
            &[addr(5002), addr(5001)]
        );
    }

    #[test]
    fn test_lookup_count_zero() {
        let ring = abc_ring();
        assert!(ring.lookup("anything", 0).is_empty());
    }

    #[test]
    fn test_lookup_returns_distinct_nodes_for_random_keys() {
        let mut ring = HashRing::new(3);
        for port in 7000..7006 {
            ring.insert(&addr(port));
        }

        let mut rng = rand::thread_rng();
        for _ in 0..500 {
            let key = format!("key-{}", rng.r#gen::<u64>());
            let set = ring.lookup(&key, 3);
            assert_eq!(set.len(), 3);

            let distinct: HashSet<_> = set.nodes().iter().collect();
            assert_eq!(distinct.len(), 3, "duplicate node in {:?}", set);
            assert_eq!(ring.lookup(&key, 3), set);
        }
    }

    #[test]
    fn test_lookup_size_tracks_node_count() {
        let mut ring = HashRing::new(3);
        for (count, port) in (1..=5).zip(8000..) {
            ring.insert(&addr(port));
            let set = ring.lookup("sized-key", 3);
            assert_eq!(set.len(), count.min(3));
        }
    }

    // ============================================================
    // REBALANCING TESTS
    // ============================================================

    #[test]
    fn test_adding_node_moves_keys_only_to_newcomer() {
        let mut ring = HashRing::new(3);
        for i in 1..=5 {
            ring.insert(&NodeAddr::new(format!("10.0.0.{}", i), 7000));
        }
        let before = ring.clone();

        let newcomer = NodeAddr::new("10.0.0.6", 7000);
        ring.insert(&newcomer);

        let mut rng = rand::thread_rng();
        let samples = 2000;
        let mut moved = 0;
        for _ in 0..samples {
            let key = format!("key-{}", rng.r#gen::<u64>());
            let old_primary = before.lookup(&key, 1).into_vec();
            let new_primary = ring.lookup(&key, 1).into_vec();

            if old_primary != new_primary {
                assert_eq!(new_primary, vec![newcomer.clone()]);
                moved += 1;
            }
        }

        // Naive `hash % N` placement would move ~5/6 of the keys.
        let fraction = moved as f64 / samples as f64;
        assert!(fraction > 0.0, "newcomer took no keys");
        assert!(fraction < 0.5, "too many keys moved: {}", fraction);
    }

    #[test]
    fn test_removing_node_moves_only_its_keys() {
        let ring = abc_ring();
        let mut shrunk = ring.clone();
        shrunk.remove(&addr(5003));

        for i in 0..300 {
            let key = format!("user:{}", i);
            let old_primary = ring.lookup(&key, 1).into_vec();
            if old_primary != vec![addr(5003)] {
                assert_eq!(shrunk.lookup(&key, 1).into_vec(), old_primary);
            }
        }
    }
}
