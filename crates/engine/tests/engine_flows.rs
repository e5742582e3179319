//! End-to-end flows through the engine: raw payload strings in, dispatched
//! events and state out.

use std::sync::Arc;

use waypost_engine::{command, Engine, EngineConfig};
use waypost_events::{EventKind, RecordingDispatcher};

fn engine() -> (Engine, Arc<RecordingDispatcher>) {
    let dispatcher = Arc::new(RecordingDispatcher::new());
    let engine = Engine::new(EngineConfig::default(), dispatcher.clone());
    (engine, dispatcher)
}

#[tokio::test]
async fn commute_day_produces_deduplicated_events() {
    let (engine, dispatcher) = engine();
    let topic = "owntracks/alice/phone";

    // Morning: at home, client replays the enter after a reconnect.
    let enter_home = r#"{"_type":"transition","event":"enter","desc":"home","lat":52.10,"lon":4.30,"tst":1700000000,"acc":12,"rad":150}"#;
    engine.handle_message(topic, enter_home).await.unwrap();
    engine.handle_message(topic, enter_home).await.unwrap();

    // Periodic report from inside, with battery.
    let at_home = r#"{"_type":"location","lat":52.10,"lon":4.30,"tst":1700000600,"acc":8,"batt":96,"inregions":["home"]}"#;
    engine.handle_message(topic, at_home).await.unwrap();

    // The leave never arrives; the next report shows an empty snapshot.
    let on_the_road = r#"{"_type":"location","lat":52.20,"lon":4.40,"tst":1700003600,"acc":15,"batt":91,"inregions":[]}"#;
    engine.handle_message(topic, on_the_road).await.unwrap();

    // Arrival at the office reported only through the snapshot.
    let at_office = r#"{"_type":"location","lat":52.30,"lon":4.50,"tst":1700007200,"acc":10,"inregions":["office"]}"#;
    engine.handle_message(topic, at_office).await.unwrap();

    let user = engine.users().get("alice").unwrap();
    assert_eq!(user.fence, "office");
    assert_eq!(user.battery, Some(91));
    assert!(user.inregions_supported);

    let kinds: Vec<EventKind> = dispatcher.events().iter().map(|e| e.kind).collect();
    assert_eq!(
        kinds,
        vec![
            EventKind::Enter,   // explicit enter (replay suppressed)
            EventKind::Generic,
            EventKind::Battery, // at home
            EventKind::Battery, // on the road
            EventKind::Leave,   // synthesized from the empty snapshot
            EventKind::Generic,
            EventKind::Enter,   // synthesized from the office snapshot
            EventKind::Generic,
        ]
    );
}

#[tokio::test]
async fn fence_sync_round_trip() {
    let (engine, _dispatcher) = engine();
    let topic = "owntracks/bob/phone";

    let bulk = r#"{"_type":"waypoints","waypoints":[
        {"desc":"office","lat":52.0,"lon":4.0,"rad":80,"tst":1700000000},
        {"desc":"home","lat":52.1,"lon":4.3,"rad":120,"tst":1700000000}
    ]}"#;
    engine.handle_message(topic, bulk).await.unwrap();

    // A transition refreshes the fence it names, even while suppressed.
    let stale_leave = r#"{"_type":"transition","event":"leave","desc":"home","lat":52.1,"lon":4.3,"tst":1700000100,"acc":9,"rad":90}"#;
    engine.handle_message(topic, stale_leave).await.unwrap();
    assert_eq!(engine.fences().get("home").unwrap().radius, 90.0);

    let payload = engine
        .build_command(command::SET_WAYPOINTS)
        .unwrap()
        .unwrap();
    let value: serde_json::Value = serde_json::from_str(&payload).unwrap();
    let waypoints = value["waypoints"]["waypoints"].as_array().unwrap();
    assert_eq!(waypoints.len(), 2);
    assert_eq!(waypoints[0]["desc"], "home");
    assert_eq!(waypoints[1]["desc"], "office");
}

#[tokio::test]
async fn users_are_tracked_independently() {
    let (engine, dispatcher) = engine();

    let enter = |fence: &str| {
        format!(
            r#"{{"_type":"transition","event":"enter","desc":"{fence}","lat":52.1,"lon":4.3,"tst":1700000000,"acc":10}}"#
        )
    };
    engine
        .handle_message("owntracks/alice/phone", &enter("home"))
        .await
        .unwrap();
    engine
        .handle_message("owntracks/bob/phone", &enter("office"))
        .await
        .unwrap();

    assert_eq!(engine.users().get("alice").unwrap().fence, "home");
    assert_eq!(engine.users().get("bob").unwrap().fence, "office");
    assert_eq!(dispatcher.events_of(EventKind::Enter).len(), 2);

    // bob switches devices; his record follows, alice is untouched
    engine
        .handle_message("owntracks/bob/tablet", &enter("office"))
        .await
        .unwrap();
    assert_eq!(engine.users().get("bob").unwrap().device_id, "tablet");
    assert_eq!(engine.users().len(), 2);
}
