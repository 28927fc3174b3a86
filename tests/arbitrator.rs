use std::sync::Arc;

use bot_tournament::{
    arbitrator::{Arbitrator, BoardArbitrator, MatchOptions, MatchResultKind},
    error::TransportError,
    events::TournamentEvent,
    player::Player,
    player_client::PlayerClient,
};
use common::{epoch_clock, RecordingEvents, ScriptedTransport};
use serde_json::json;

mod common;

fn p1() -> Player {
    Player::new("P1", 3001)
}

fn p2() -> Player {
    Player::new("P2", 3002)
}

fn referee(transport: ScriptedTransport) -> (BoardArbitrator<ScriptedTransport>, Arc<RecordingEvents>) {
    let events = Arc::new(RecordingEvents::default());
    let arbitrator = BoardArbitrator::with_client(
        PlayerClient::with_transport(transport),
        events.clone(),
        epoch_clock(),
    );
    (arbitrator, events)
}

#[tokio::test]
async fn three_in_a_row_wins() {
    common::init_test_logger();
    let (arbitrator, events) = referee(ScriptedTransport::default().moves(3001, &[0, 1, 2]).moves(3002, &[3, 4]));
    let outcome = arbitrator
        .run_match([p1(), p2()], MatchOptions::default())
        .await
        .unwrap();

    assert_eq!(outcome.result, MatchResultKind::Win);
    assert_eq!(outcome.winner, Some(p1()));
    assert_eq!(outcome.moves.len(), 5);
    assert!(outcome.duration_ms.is_some());

    let names = events.names();
    assert_eq!(names.first(), Some(&"match:start"));
    assert_eq!(names.iter().filter(|n| **n == "match:move").count(), 5);
    match events.events().last() {
        Some(TournamentEvent::MatchWin { winner, line, board, timestamp }) => {
            assert_eq!(winner, &p1());
            assert_eq!(line, &vec![0, 1, 2]);
            assert_eq!(board, &vec![1, 1, 1, 2, 2, 0, 0, 0, 0]);
            assert_eq!(timestamp, "1970-01-01T00:00:00Z");
        }
        other => panic!("expected a win event, got {other:?}"),
    }
    assert_eq!(arbitrator_urls_first(&arbitrator), "http://localhost:3001/move");
}

fn arbitrator_urls_first(arbitrator: &BoardArbitrator<ScriptedTransport>) -> String {
    arbitrator.client().transport().urls()[0].clone()
}

#[tokio::test]
async fn full_board_without_line_is_a_draw() {
    let transport = ScriptedTransport::default()
        .moves(3001, &[0, 2, 3, 7, 8])
        .moves(3002, &[1, 4, 6, 5]);
    let (arbitrator, events) = referee(transport);
    let outcome = arbitrator
        .run_match([p1(), p2()], MatchOptions::default())
        .await
        .unwrap();

    assert_eq!(outcome.result, MatchResultKind::Draw);
    assert_eq!(outcome.winner, None);
    assert_eq!(outcome.moves.len(), 9);
    assert_eq!(events.names().last(), Some(&"match:draw"));
}

#[tokio::test]
async fn timeout_forfeits_to_the_opponent() {
    let transport = ScriptedTransport::default().script(3001, [Err(TransportError::Timeout)]);
    let (arbitrator, events) = referee(transport);
    let outcome = arbitrator
        .run_match([p1(), p2()], MatchOptions::default())
        .await
        .unwrap();

    assert_eq!(outcome.result, MatchResultKind::Win);
    assert_eq!(outcome.winner, Some(p2()));
    assert_eq!(outcome.error.as_deref(), Some("Tiempo de espera agotado"));
    assert_eq!(events.names(), ["match:start", "match:error"]);
}

#[tokio::test]
async fn illegal_moves_forfeit() {
    let (arbitrator, _) = referee(ScriptedTransport::default().moves(3001, &[0]).moves(3002, &[9]));
    let outcome = arbitrator
        .run_match([p1(), p2()], MatchOptions::default())
        .await
        .unwrap();
    assert_eq!(outcome.winner, Some(p1()));
    assert_eq!(outcome.error.as_deref(), Some("Movimiento fuera de rango"));

    let (arbitrator, _) = referee(ScriptedTransport::default().moves(3001, &[4]).moves(3002, &[4]));
    let outcome = arbitrator
        .run_match([p1(), p2()], MatchOptions::default())
        .await
        .unwrap();
    assert_eq!(outcome.winner, Some(p1()));
    assert!(outcome.error.unwrap().contains("already taken"));

    let transport = ScriptedTransport::default().script(3001, [Ok(json!({"ok": true}))]);
    let (arbitrator, _) = referee(transport);
    let outcome = arbitrator
        .run_match([p1(), p2()], MatchOptions::default())
        .await
        .unwrap();
    assert_eq!(outcome.winner, Some(p2()));
    assert_eq!(outcome.error.as_deref(), Some("Respuesta sin movimiento válido"));
}

#[tokio::test]
async fn no_tie_lifts_oldest_marks() {
    let transport = ScriptedTransport::default()
        .moves(3001, &[0, 1, 8, 5])
        .moves(3002, &[3, 4, 2, 6]);
    let (arbitrator, events) = referee(transport);
    let options = MatchOptions {
        no_tie: true,
        ..Default::default()
    };
    let outcome = arbitrator.run_match([p1(), p2()], options).await.unwrap();

    assert_eq!(outcome.winner, Some(p2()));
    let removed: Vec<_> = events
        .events()
        .into_iter()
        .filter_map(|e| match e {
            TournamentEvent::MoveRemoved { player, cell, .. } => Some((player.name, cell)),
            _ => None,
        })
        .collect();
    assert_eq!(removed, [("P1".to_string(), 0), ("P2".to_string(), 3)]);
    match events.events().last() {
        Some(TournamentEvent::MatchWin { line, .. }) => assert_eq!(line, &vec![2, 4, 6]),
        other => panic!("expected a win event, got {other:?}"),
    }
}

#[tokio::test]
async fn five_by_five_needs_four() {
    let transport = ScriptedTransport::default()
        .moves(3001, &[0, 1, 2, 3])
        .moves(3002, &[5, 6, 7]);
    let (arbitrator, events) = referee(transport);
    let options = MatchOptions {
        board_size: 5,
        ..Default::default()
    };
    let outcome = arbitrator.run_match([p1(), p2()], options).await.unwrap();

    assert_eq!(outcome.winner, Some(p1()));
    assert_eq!(outcome.moves.len(), 7);
    assert!(matches!(
        events.events().first(),
        Some(TournamentEvent::MatchStart { board_size: 5, .. })
    ));
}

#[tokio::test]
async fn human_seats_are_not_played() {
    let (arbitrator, events) = referee(ScriptedTransport::default());
    let outcome = arbitrator
        .run_match([Player::human("Ana"), p2()], MatchOptions::default())
        .await
        .unwrap();

    assert_eq!(outcome.result, MatchResultKind::Error);
    assert_eq!(outcome.winner, None);
    assert!(arbitrator.client().transport().urls().is_empty());
    assert_eq!(events.names(), ["match:start", "match:error"]);
}

#[tokio::test]
async fn unsupported_board_size_is_an_error() {
    let (arbitrator, _) = referee(ScriptedTransport::default());
    let options = MatchOptions {
        board_size: 4,
        ..Default::default()
    };
    assert!(arbitrator.run_match([p1(), p2()], options).await.is_err());
}
