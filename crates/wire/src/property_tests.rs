// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Property tests for protocol serde roundtrips.
//!
//! Covers every variant of both request/response pairs with minimal
//! fixed field values, plus frame-layer roundtrips over arbitrary
//! payload sizes.

use std::collections::HashMap;

use bf_core::{AgentDescriptor, BuildRequest, Entries, OutputFile};
use proptest::prelude::*;

use crate::frame::{decode, encode, read_message, write_message};
use crate::{AgentRequest, AgentResponse, DirectoryRequest, DirectoryResponse};

fn s() -> String {
    String::new()
}

fn descriptor() -> AgentDescriptor {
    AgentDescriptor::new("127.0.0.1:4100".parse().unwrap(), Entries::new())
}

fn all_agent_requests() -> Vec<AgentRequest> {
    vec![
        AgentRequest::Ping,
        AgentRequest::Describe,
        AgentRequest::IsBusy,
        AgentRequest::Claim,
        AgentRequest::TryClaim,
        AgentRequest::Build { request: BuildRequest::new("p") },
        AgentRequest::Results,
        AgentRequest::FetchOutputs,
        AgentRequest::ClearOutputs,
    ]
}

fn all_agent_responses() -> Vec<AgentResponse> {
    vec![
        AgentResponse::Pong,
        AgentResponse::Descriptor { descriptor: descriptor() },
        AgentResponse::Busy { busy: false },
        AgentResponse::Claimed,
        AgentResponse::ClaimOutcome { won: false },
        AgentResponse::Progress { text: s() },
        AgentResponse::BuildFinished,
        AgentResponse::BuildFailed { message: s() },
        AgentResponse::Results { properties: HashMap::new() },
        AgentResponse::Outputs { files: vec![OutputFile { path: s(), contents: vec![] }] },
        AgentResponse::Cleared,
        AgentResponse::Error { message: s() },
    ]
}

fn all_directory_requests() -> Vec<DirectoryRequest> {
    vec![
        DirectoryRequest::Ping,
        DirectoryRequest::Register { descriptor: descriptor(), ttl_ms: 0 },
        DirectoryRequest::Renew { id: "agt-x".into(), ttl_ms: 0 },
        DirectoryRequest::Deregister { id: "agt-x".into() },
        DirectoryRequest::Lookup { filter: Entries::new() },
    ]
}

fn all_directory_responses() -> Vec<DirectoryResponse> {
    vec![
        DirectoryResponse::Pong,
        DirectoryResponse::Registered,
        DirectoryResponse::Renewed,
        DirectoryResponse::UnknownRegistration,
        DirectoryResponse::Deregistered,
        DirectoryResponse::Matches { agents: vec![] },
        DirectoryResponse::Error { message: s() },
    ]
}

proptest! {
    #[test]
    fn agent_request_serde_roundtrip(req in proptest::sample::select(all_agent_requests())) {
        let encoded = encode(&req).expect("encode");
        let decoded: AgentRequest = decode(&encoded).expect("decode");
        prop_assert_eq!(decoded, req);
    }

    #[test]
    fn agent_response_serde_roundtrip(resp in proptest::sample::select(all_agent_responses())) {
        let encoded = encode(&resp).expect("encode");
        let decoded: AgentResponse = decode(&encoded).expect("decode");
        prop_assert_eq!(decoded, resp);
    }

    #[test]
    fn directory_request_serde_roundtrip(req in proptest::sample::select(all_directory_requests())) {
        let encoded = encode(&req).expect("encode");
        let decoded: DirectoryRequest = decode(&encoded).expect("decode");
        prop_assert_eq!(decoded, req);
    }

    #[test]
    fn directory_response_serde_roundtrip(resp in proptest::sample::select(all_directory_responses())) {
        let encoded = encode(&resp).expect("encode");
        let decoded: DirectoryResponse = decode(&encoded).expect("decode");
        prop_assert_eq!(decoded, resp);
    }

    #[test]
    fn framing_roundtrips_arbitrary_payloads(payload in proptest::collection::vec(any::<u8>(), 0..4096)) {
        let rt = tokio::runtime::Builder::new_current_thread().build().expect("runtime");
        rt.block_on(async {
            let mut buffer = Vec::new();
            write_message(&mut buffer, &payload).await.expect("write");
            let mut cursor = std::io::Cursor::new(buffer);
            let back = read_message(&mut cursor).await.expect("read");
            assert_eq!(back, payload);
        });
    }
}
