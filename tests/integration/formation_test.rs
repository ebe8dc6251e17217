//! Integration tests for formation assignment and pair rotation.

mod helpers;

use std::collections::HashSet;
use std::io::Write;
use std::sync::Arc;

use chrono::Utc;

use ministry_core::config::FormationConfig;
use ministry_core::types::id::NoticeId;
use ministry_entity::formation::{FormationRequest, FormationSlot};
use ministry_entity::notice::{NewNotice, NoticeCategory};
use ministry_service::formation::formation_for_notice;
use ministry_service::{FormationAssigner, RosterCatalog, RotationState};

use helpers::{test_assigner, test_catalog};

fn pair_member(slots: &[FormationSlot]) -> String {
    slots
        .iter()
        .find(|s| s.participant_id.starts_with('P'))
        .map(|s| s.participant_id.clone())
        .expect("pair seat present")
}

fn assert_no_duplicates(slots: &[FormationSlot]) {
    let ids: HashSet<&str> = slots.iter().map(|s| s.participant_id.as_str()).collect();
    assert_eq!(ids.len(), slots.len(), "duplicate participant in {slots:?}");
    let labels: HashSet<&str> = slots.iter().map(|s| s.slot_label.as_str()).collect();
    assert_eq!(labels.len(), slots.len(), "duplicate label in {slots:?}");
}

#[test]
fn test_pair_rotation_scenario() {
    let assigner = test_assigner();
    let request = |entity: &str| FormationRequest::new("TeamX", "08:00", "dir-9", entity);

    let first = assigner.assign(&request("svc-1"));
    let again = assigner.assign(&request("svc-1"));
    let next = assigner.assign(&request("svc-2"));

    assert_eq!(pair_member(&first), "P1");
    assert_eq!(pair_member(&again), "P1");
    assert_eq!(pair_member(&next), "P2");
    assert_eq!(first, again);
}

#[test]
fn test_director_collision_scenario() {
    let assigner = test_assigner();
    let slots = assigner.assign(&FormationRequest::new("TeamX", "08:00", "L1", "svc-1"));

    let lead = slots.iter().find(|s| s.is_team_lead).expect("lead seat");
    assert_ne!(lead.participant_id, "L1");
    // L2 leads the choir, so the non-lead L3 is preferred.
    assert_eq!(lead.participant_id, "L3");
    assert_no_duplicates(&slots);
}

#[test]
fn test_director_never_leads_for_any_input() {
    let assigner = test_assigner();
    let directors = ["L1", "L2", "L3", "keys", "P1", "someone"];
    let times = ["08:00", "8:00", "08:00:00", "18:00", "6:00 PM", "23:59", "bogus"];

    for (n, director) in directors.iter().enumerate() {
        for time in times {
            let slots = assigner.assign(&FormationRequest::new(
                "TeamX",
                time,
                *director,
                format!("svc-{n}"),
            ));
            for slot in slots.iter().filter(|s| s.is_team_lead) {
                assert_ne!(&slot.participant_id, director, "at {time}");
            }
            assert_no_duplicates(&slots);
        }
    }
}

#[test]
fn test_time_slot_spellings_agree() {
    let assigner = test_assigner();
    let lead_at = |time: &str| {
        assigner.assign(&FormationRequest::new("TeamX", time, "", "svc-1"))[0]
            .participant_id
            .clone()
    };
    assert_eq!(lead_at("18:00"), "L3");
    assert_eq!(lead_at("6:00 PM"), "L3");
    assert_eq!(lead_at("18:00:00"), "L3");
    // Unknown slot falls back to the 08:00 bucket.
    assert_eq!(lead_at("12:15"), "L1");
}

#[test]
fn test_fixed_team_and_unknown_team() {
    let assigner = test_assigner();
    let choir = assigner.assign(&FormationRequest::new("choir", "08:00", "L2", "svc-1"));
    let ids: Vec<&str> = choir.iter().map(|s| s.participant_id.as_str()).collect();
    assert_eq!(ids, vec!["L2", "alto"]);
    assert_eq!(choir[1].slot_label, "Seat #2");

    assert!(
        assigner
            .assign(&FormationRequest::new("Nonexistent", "08:00", "x", "svc-1"))
            .is_empty()
    );
}

#[test]
fn test_shared_rotation_state_across_assigners() {
    let catalog = Arc::new(test_catalog());
    let rotation = Arc::new(RotationState::new());
    let config = FormationConfig::default();
    let schedule_view = FormationAssigner::new(Arc::clone(&catalog), Arc::clone(&rotation), &config);
    let overlay_view = FormationAssigner::new(catalog, Arc::clone(&rotation), &config);

    let request = |entity: &str| FormationRequest::new("TeamX", "08:00", "dir", entity);
    assert_eq!(pair_member(&schedule_view.assign(&request("svc-1"))), "P1");
    assert_eq!(pair_member(&overlay_view.assign(&request("svc-1"))), "P1");
    assert_eq!(pair_member(&overlay_view.assign(&request("svc-2"))), "P2");
    assert_eq!(pair_member(&schedule_view.assign(&request("svc-2"))), "P2");

    rotation.reset();
    assert_eq!(pair_member(&schedule_view.assign(&request("svc-2"))), "P1");
}

#[test]
fn test_service_program_notice_matches_schedule() {
    let assigner = test_assigner();
    let notice = NewNotice::new(NoticeCategory::ServiceProgram, "Sunday")
        .metadata(serde_json::json!({
            "teamName": "TeamX",
            "timeSlot": "18:00",
            "directorId": "L3",
            "eventId": "svc-7",
        }))
        .into_notice(NoticeId::new("n-1"), Utc::now());

    let from_notice = formation_for_notice(&assigner, &notice);
    let from_schedule = assigner.assign(&FormationRequest::new("TeamX", "18:00", "L3", "svc-7"));
    assert_eq!(from_notice, from_schedule);
    assert!(from_notice.iter().all(|s| !(s.is_team_lead && s.participant_id == "L3")));
}

#[test]
fn test_roster_file_through_config() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    write!(
        file,
        r#"
[[teams]]
name = "Youth"
seats = [{{ kind = "shared_role" }}, {{ kind = "pair" }}]

[teams.shared_role]
pool = [{{ id = "a", name = "Abigail" }}, {{ id = "b", name = "Bruno" }}]
schedule = [{{ time_slot = "19:00", participant_id = "a" }}]
fallback_time_slot = "19:00"

[teams.pair]
first = {{ id = "s1", name = "Sara" }}
second = {{ id = "s2", name = "Eva" }}
"#
    )
    .unwrap();

    let config = FormationConfig {
        roster_path: Some(file.path().display().to_string()),
        ..FormationConfig::default()
    };
    let assigner = FormationAssigner::new(
        Arc::new(RosterCatalog::from_config(&config).unwrap()),
        Arc::new(RotationState::new()),
        &config,
    );

    let slots = assigner.assign(&FormationRequest::new("Youth", "7:00 PM", "a", "ev-1"));
    let ids: Vec<&str> = slots.iter().map(|s| s.participant_id.as_str()).collect();
    assert_eq!(ids, vec!["b", "s1"]);
}

#[test]
fn test_builtin_roster_formations() {
    let config = FormationConfig::default();
    let assigner = FormationAssigner::new(
        Arc::new(RosterCatalog::from_config(&config).unwrap()),
        Arc::new(RotationState::new()),
        &config,
    );
    let names: Vec<String> = assigner.catalog().team_names().map(String::from).collect();
    for (i, team) in names.iter().enumerate() {
        let slots = assigner.assign(&FormationRequest::new(team.as_str(), "10:30", "m-esteban", format!("ev-{i}")));
        assert!(!slots.is_empty(), "{team}");
        assert_no_duplicates(&slots);
        assert!(
            slots
                .iter()
                .all(|s| !(s.is_team_lead && s.participant_id == "m-esteban"))
        );
    }
}
