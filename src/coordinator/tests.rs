//! Coordinator Module Tests
//!
//! ## Test Scopes
//! - **Protocol**: Parsing of requests and exact rendering of replies.
//! - **Registry**: Upsert, idempotent unregister, heartbeat semantics.
//! - **Failure Detection**: Eviction driven by an explicit clock, plus one real reaper run.
//! - **Routing**: Deterministic replica sets and the empty-ring condition.

#[cfg(test)]
mod tests {
    use crate::config::CoordinatorConfig;
    use crate::coordinator::protocol::{
        CoordinatorRequest, CoordinatorResponse, parse_node_list_reply, parse_nodes_reply,
    };
    use crate::coordinator::service::CoordinatorService;
    use crate::coordinator::types::{NodeState, Registration};
    use crate::error::ProtocolError;
    use crate::ring::types::{NodeAddr, ReplicaSet, RingPosition, VirtualNode};
    use crate::transport::{LineService, shutdown_channel};
    use std::time::{Duration, Instant};

    fn addr(port: u16) -> NodeAddr {
        NodeAddr::new("127.0.0.1", port)
    }

    fn service() -> std::sync::Arc<CoordinatorService> {
        CoordinatorService::new(&CoordinatorConfig::default())
    }

    // ============================================================
    // PROTOCOL TESTS
    // ============================================================

    #[test]
    fn test_parse_requests() {
        assert_eq!(
            CoordinatorRequest::parse("REGISTER_NODE 127.0.0.1 5001"),
            Ok(CoordinatorRequest::RegisterNode(addr(5001)))
        );
        assert_eq!(
            CoordinatorRequest::parse("UNREGISTER_NODE 127.0.0.1 5001"),
            Ok(CoordinatorRequest::UnregisterNode(addr(5001)))
        );
        assert_eq!(
            CoordinatorRequest::parse("HEARTBEAT 127.0.0.1 5001"),
            Ok(CoordinatorRequest::Heartbeat(addr(5001)))
        );
        assert_eq!(
            CoordinatorRequest::parse("GET_NODES_FOR_KEY user:100"),
            Ok(CoordinatorRequest::GetNodesForKey("user:100".to_string()))
        );
        assert_eq!(
            CoordinatorRequest::parse("LIST_NODES"),
            Ok(CoordinatorRequest::ListNodes)
        );
    }

    #[test]
    fn test_parse_rejects_malformed_requests() {
        assert_eq!(CoordinatorRequest::parse(""), Err(ProtocolError::Empty));
        assert_eq!(
            CoordinatorRequest::parse("REGISTER_NODE 127.0.0.1"),
            Err(ProtocolError::InvalidFormat("REGISTER_NODE"))
        );
        assert!(matches!(
            CoordinatorRequest::parse("REGISTER_NODE 127.0.0.1 notaport"),
            Err(ProtocolError::InvalidAddress(_))
        ));
        assert_eq!(
            CoordinatorRequest::parse("GET_NODES_FOR_KEY"),
            Err(ProtocolError::InvalidFormat("GET_NODES_FOR_KEY"))
        );
        assert_eq!(
            CoordinatorRequest::parse("FROB x"),
            Err(ProtocolError::UnknownCommand("FROB".to_string()))
        );
        assert_eq!(
            CoordinatorRequest::parse("LIST_NODES extra args"),
            Err(ProtocolError::InvalidFormat("LIST_NODES"))
        );
        assert_eq!(
            service().handle_line("LIST_NODES now"),
            "ERROR Invalid LIST_NODES format"
        );
    }

    #[test]
    fn test_request_display_matches_wire_format() {
        let request = CoordinatorRequest::RegisterNode(addr(5001));
        assert_eq!(request.to_string(), "REGISTER_NODE 127.0.0.1 5001");
        assert_eq!(CoordinatorRequest::parse(&request.to_string()), Ok(request));
    }

    #[test]
    fn test_reply_rendering() {
        let set = ReplicaSet::new(vec![addr(5002), addr(5003), addr(5001)]);
        assert_eq!(
            CoordinatorResponse::Nodes(set).to_string(),
            "PRIMARY 127.0.0.1:5002\nREPLICA 127.0.0.1:5003\nREPLICA 127.0.0.1:5001"
        );
        assert_eq!(
            CoordinatorResponse::NodeList(vec![addr(5001), addr(5002)]).to_string(),
            "OK Nodes:\n127.0.0.1:5001\n127.0.0.1:5002"
        );
        assert_eq!(
            CoordinatorResponse::NodeList(vec![]).to_string(),
            "OK Nodes:"
        );
        assert_eq!(
            CoordinatorResponse::NoNodesAvailable.to_string(),
            "ERROR No nodes available"
        );
        assert_eq!(
            CoordinatorResponse::Error(ProtocolError::UnknownCommand("X".into())).to_string(),
            "ERROR Unknown command X"
        );
    }

    #[test]
    fn test_parse_replies() {
        let reply = "PRIMARY 127.0.0.1:5002\nREPLICA 127.0.0.1:5003\nREPLICA 127.0.0.1:5001";
        let set = parse_nodes_reply(reply).unwrap().unwrap();
        assert_eq!(set.nodes(), &[addr(5002), addr(5003), addr(5001)]);

        assert_eq!(parse_nodes_reply("ERROR No nodes available"), Ok(None));
        assert!(parse_nodes_reply("ERROR Unknown command").is_err());
        assert!(parse_nodes_reply("REPLICA 127.0.0.1:5003").is_err());

        assert_eq!(
            parse_node_list_reply("OK Nodes:\n127.0.0.1:5001\n  127.0.0.1:5002"),
            Ok(vec![addr(5001), addr(5002)])
        );
        assert_eq!(parse_node_list_reply("OK Nodes:"), Ok(vec![]));
        assert!(parse_node_list_reply("ERROR nope").is_err());
    }

    // ============================================================
    // REGISTRY TESTS
    // ============================================================

    #[test]
    fn test_register_is_an_upsert() {
        let service = service();
        assert_eq!(service.register(&addr(5001)), Registration::Joined);
        assert_eq!(service.register(&addr(5001)), Registration::Refreshed);
        assert_eq!(service.list_nodes(), vec![addr(5001)]);

        let member = service.member(&addr(5001)).unwrap();
        assert_eq!(member.state, NodeState::Alive);
        assert_eq!(member.positions.len(), 3);
    }

    #[test]
    fn test_unregister_is_idempotent() {
        let service = service();
        service.register(&addr(5001));

        assert!(service.unregister(&addr(5001)));
        assert!(!service.unregister(&addr(5001)));
        assert!(service.list_nodes().is_empty());

        let reply = service.handle_line("UNREGISTER_NODE 127.0.0.1 5001");
        assert_eq!(reply, "OK Node 127.0.0.1:5001 unregistered");
    }

    #[test]
    fn test_heartbeat_refreshes_without_touching_ring() {
        let service = service();
        let start = Instant::now();
        service.register_at(&addr(5001), start);
        let ring_before = service.nodes_for_key("any-key");

        let later = start + Duration::from_secs(4);
        assert!(service.heartbeat_at(&addr(5001), later));
        assert_eq!(service.member(&addr(5001)).unwrap().last_heartbeat, later);
        assert_eq!(service.nodes_for_key("any-key"), ring_before);

        assert!(!service.heartbeat(&addr(5999)));
        assert!(service.member(&addr(5999)).is_none());
        assert_eq!(service.list_nodes(), vec![addr(5001)]);
    }

    #[test]
    fn test_heartbeat_from_unknown_node_asks_for_registration() {
        let service = service();
        assert_eq!(
            service.handle_line("HEARTBEAT 127.0.0.1 5001"),
            "ERROR Node 127.0.0.1:5001 not registered"
        );

        service.handle_line("REGISTER_NODE 127.0.0.1 5001");
        assert_eq!(
            service.handle_line("HEARTBEAT 127.0.0.1 5001"),
            "OK Heartbeat 127.0.0.1:5001"
        );
    }

    // ============================================================
    // FAILURE DETECTION TESTS
    // ============================================================

    #[test]
    fn test_silent_node_is_evicted() {
        let service = service();
        let start = Instant::now();
        service.register_at(&addr(5001), start);
        service.register_at(&addr(5002), start);

        // Within the timeout nothing happens.
        assert!(service.evict_expired(start + Duration::from_secs(10)).is_empty());

        // 5002 keeps heartbeating, 5001 goes quiet.
        service.heartbeat_at(&addr(5002), start + Duration::from_secs(8));
        let evicted = service.evict_expired(start + Duration::from_secs(11));

        assert_eq!(evicted.len(), 1);
        assert_eq!(evicted[0].addr, addr(5001));
        assert_eq!(evicted[0].state, NodeState::Dead);
        let released: Vec<RingPosition> = (0..3)
            .map(|index| VirtualNode::new(addr(5001), index).position())
            .collect();
        assert_eq!(evicted[0].positions, released);
        assert_eq!(service.list_nodes(), vec![addr(5002)]);

        for i in 0..50 {
            let set = service.nodes_for_key(&format!("key-{}", i));
            assert!(!set.nodes().contains(&addr(5001)));
        }
    }

    #[test]
    fn test_evicted_node_can_register_again() {
        let service = service();
        let start = Instant::now();
        service.register_at(&addr(5001), start);
        service.evict_expired(start + Duration::from_secs(30));
        assert!(service.list_nodes().is_empty());

        assert_eq!(service.register(&addr(5001)), Registration::Joined);
        assert_eq!(service.list_nodes(), vec![addr(5001)]);
    }

    #[tokio::test]
    async fn test_reaper_task_evicts_and_stops() {
        let config = CoordinatorConfig {
            eviction_timeout_ms: 100,
            reaper_interval_ms: 20,
            ..CoordinatorConfig::default()
        };
        let service = CoordinatorService::new(&config);
        service.register(&addr(5001));

        let (handle, signal) = shutdown_channel();
        let reaper = tokio::spawn(service.clone().run_reaper(config.reaper_interval(), signal));

        let deadline = Instant::now() + Duration::from_secs(2);
        while !service.list_nodes().is_empty() && Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert!(service.list_nodes().is_empty());
        assert_eq!(
            service.handle_line("GET_NODES_FOR_KEY user:100"),
            "ERROR No nodes available"
        );

        handle.trigger();
        tokio::time::timeout(Duration::from_secs(1), reaper)
            .await
            .expect("reaper should stop on shutdown")
            .unwrap();
    }

    // ============================================================
    // ROUTING TESTS
    // ============================================================

    #[test]
    fn test_get_nodes_for_key_scenario() {
        let service = service();
        for port in [5001, 5002, 5003] {
            service.handle_line(&format!("REGISTER_NODE 127.0.0.1 {}", port));
        }

        let expected = "PRIMARY 127.0.0.1:5002\nREPLICA 127.0.0.1:5003\nREPLICA 127.0.0.1:5001";
        for _ in 0..5 {
            assert_eq!(service.handle_line("GET_NODES_FOR_KEY user:100"), expected);
        }
    }

    #[test]
    fn test_get_nodes_for_key_on_empty_ring() {
        let service = service();
        assert_eq!(
            service.handle_line("GET_NODES_FOR_KEY user:100"),
            "ERROR No nodes available"
        );
    }

    #[test]
    fn test_replica_set_is_capped_by_replication_factor() {
        let config = CoordinatorConfig {
            replication_factor: 2,
            ..CoordinatorConfig::default()
        };
        let service = CoordinatorService::new(&config);
        for port in 5001..5006 {
            service.register(&addr(port));
        }
        assert_eq!(service.nodes_for_key("user:100").len(), 2);
    }

    #[test]
    fn test_list_nodes_is_sorted() {
        let service = service();
        for port in [5003, 5001, 5002] {
            service.register(&addr(port));
        }
        assert_eq!(
            service.handle_line("LIST_NODES"),
            "OK Nodes:\n127.0.0.1:5001\n127.0.0.1:5002\n127.0.0.1:5003"
        );
    }

    #[test]
    fn test_malformed_request_gets_error_token() {
        let service = service();
        assert_eq!(service.handle_line("BOGUS"), "ERROR Unknown command BOGUS");
        assert_eq!(
            service.handle_line("REGISTER_NODE onlyhost"),
            "ERROR Invalid REGISTER_NODE format"
        );
    }
}
