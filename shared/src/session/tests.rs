use super::*;
use crate::simulator::SignalInfo;
use crate::testing::{FakeSimulator, Journal, RecordingUi, signal_info};

fn full_signals() -> SignalInfo {
    signal_info(&[("CLK1", 0, 1), ("RESET", 1, 1), ("BA", 2, 8)], 10)
}

fn lite_signals() -> SignalInfo {
    signal_info(&[("CLK1", 0, 1), ("IRQ", 3, 1)], 4)
}

/// Session whose launcher hands out fakes configured by `setup`.
fn session_with(
    journal: &Journal,
    setup: impl Fn(&mut FakeSimulator) + 'static,
) -> Session<FakeSimulator, RecordingUi> {
    let journal = journal.clone();
    Session::new(
        AppConfig::default(),
        move || {
            let mut simulator = FakeSimulator::default().with_journal(&journal);
            simulator.signals_by_profile = vec![
                (MachineProfile::Full, full_signals()),
                (MachineProfile::Lite, lite_signals()),
            ];
            setup(&mut simulator);
            simulator
        },
        RecordingUi::default(),
    )
}

fn running_session() -> (Session<FakeSimulator, RecordingUi>, Journal) {
    let journal = Journal::default();
    let mut session = session_with(&journal, |_| {});
    session.switch_machine(MachineProfile::Full).unwrap();
    (session, journal)
}

fn stalling_session() -> Session<FakeSimulator, RecordingUi> {
    let journal = Journal::default();
    let mut session = session_with(&journal, |simulator| simulator.clock_advances = false);
    session.switch_machine(MachineProfile::Full).unwrap();
    session
}

#[test]
fn launch_builds_everything_and_starts_timer() {
    let (session, journal) = running_session();
    assert_eq!(session.state(), SessionState::Running);
    assert!(session.ui().timer_running);
    assert_eq!(session.ui().viewport, Some(MachineProfile::Full));
    assert_eq!(session.ui().open_panels, PanelKind::STARTUP.to_vec());
    assert_eq!(session.ui().signal_names, vec!["BA", "CLK1", "RESET"]);
    assert_eq!(session.binding().unwrap().len(), 10);
    assert_eq!(session.binding().unwrap().bound_count(), 2);
    assert_eq!(session.simulator().unwrap().dwell_ms, Some(75));
    assert_eq!(journal.borrow().as_slice(), ["launch commodore_pet"]);
    assert!(session.ui().controls.unwrap().run);
}

#[test]
fn work_tick_refreshes_in_order() {
    let (mut session, _) = running_session();
    session.ui_mut().calls.clear();
    assert_eq!(session.tick(), TickOutcome::Refreshed);
    let calls: Vec<&str> = session
        .ui()
        .calls
        .iter()
        .copied()
        .filter(|call| *call != "controls")
        .collect();
    assert_eq!(calls, vec!["signals", "cpu", "clock", "screen", "keyboard"]);
    let styles = session.ui().styles.as_ref().unwrap();
    assert_eq!(styles.get("--sig-CLK1"), Some("#3a3a3a"));
    assert_eq!(styles.get("--sig-RESET"), Some("#3a3a3a"));
}

#[test]
fn no_work_tick_skips_every_refresh() {
    let journal = Journal::default();
    let mut session = session_with(&journal, |simulator| simulator.performs_work = false);
    session.switch_machine(MachineProfile::Full).unwrap();
    session.ui_mut().calls.clear();

    for _ in 0..5 {
        assert_eq!(session.tick(), TickOutcome::NoWork);
    }
    assert!(session.ui().calls.iter().all(|call| *call == "controls"));
    assert_eq!(session.simulator().unwrap().signal_data_reads.get(), 0);
    // no progress without work is not a stall
    assert_eq!(session.state(), SessionState::Running);
    assert!(session.ui().timer_running);
}

#[test]
fn failing_clock_read_skips_clock_and_stall_check_only() {
    let journal = Journal::default();
    let mut session = session_with(&journal, |simulator| {
        simulator.failing_queries = vec!["cpu_info", "clock_info"];
        simulator.clock_advances = false;
    });
    session.switch_machine(MachineProfile::Full).unwrap();
    session.ui_mut().calls.clear();

    for _ in 0..3 {
        assert_eq!(session.tick(), TickOutcome::Refreshed);
    }
    let ui = session.ui();
    assert_eq!(ui.count("signals"), 3);
    assert_eq!(ui.count("cpu"), 0);
    assert_eq!(ui.count("clock"), 0);
    assert_eq!(ui.count("screen"), 3);
    assert_eq!(ui.count("keyboard"), 3);
    // a frozen clock goes unnoticed while it cannot be read
    assert_eq!(session.refresh_state().last_tick, None);
    assert_eq!(session.state(), SessionState::Running);
    assert!(ui.timer_running);
}

#[test]
fn failing_peripheral_reads_still_finish_the_tick() {
    let journal = Journal::default();
    let mut session = session_with(&journal, |simulator| {
        simulator.failing_queries = vec!["display_info", "keys_down"];
        simulator.clock_advances = false;
    });
    session.switch_machine(MachineProfile::Full).unwrap();
    session.ui_mut().calls.clear();

    assert_eq!(session.tick(), TickOutcome::Refreshed);
    assert_eq!(session.ui().count("screen"), 0);
    assert_eq!(session.ui().count("keyboard"), 0);
    assert_eq!(session.ui().count("clock"), 1);
    assert_eq!(session.tick(), TickOutcome::Stalled);
    assert_eq!(session.state(), SessionState::Stalled);
}

#[test]
fn identical_clock_reads_stall_and_commands_resume() {
    let mut session = stalling_session();
    assert_eq!(session.tick(), TickOutcome::Refreshed);
    assert_eq!(session.tick(), TickOutcome::Stalled);
    assert_eq!(session.state(), SessionState::Stalled);
    assert!(!session.ui().timer_running);
    assert!(!session.refresh_state().timer_active);
    assert_eq!(session.tick(), TickOutcome::Inactive);

    for command in [
        ControlCommand::Run,
        ControlCommand::StepInstruction,
        ControlCommand::StepClock,
        ControlCommand::Reset,
    ] {
        session.command(command);
        assert_eq!(session.state(), SessionState::Running, "{command:?}");
        assert!(session.ui().timer_running);
        // reactivation forgets the previous reading
        assert_eq!(session.refresh_state().last_tick, None);
        assert_eq!(session.tick(), TickOutcome::Refreshed);
        assert_eq!(session.tick(), TickOutcome::Stalled);
    }
}

#[test]
fn pause_leaves_timer_to_stall_detector() {
    let (mut session, journal) = running_session();
    session.command(ControlCommand::Run);
    let starts = session.ui().count("start_timer");
    session.command(ControlCommand::Pause);
    assert!(session.ui().timer_running);
    assert_eq!(session.ui().count("start_timer"), starts);
    assert_eq!(session.state(), SessionState::Running);
    assert!(journal.borrow().iter().any(|entry| entry == "pause"));
}

#[test]
fn controls_follow_run_state() {
    let (mut session, _) = running_session();
    session.command(ControlCommand::Run);
    let controls = session.ui().controls.unwrap();
    assert!(controls.pause && !controls.run && !controls.step);
    session.command(ControlCommand::Pause);
    let controls = session.ui().controls.unwrap();
    assert!(!controls.pause && controls.run && controls.step);
}

#[test]
fn switching_machine_tears_down_then_rebuilds() {
    let mut session = stalling_session();
    let journal = session.simulator().unwrap().journal.clone();
    session.open_panel(PanelKind::SignalDetails);
    session.tick();
    assert!(session.refresh_state().last_tick.is_some());
    session.ui_mut().calls.clear();

    session.switch_machine(MachineProfile::Lite).unwrap();

    assert_eq!(
        &session.ui().calls[..4],
        ["cancel_timer", "panels", "teardown_viewport", "build_viewport"]
    );
    let log = journal.borrow();
    let stop = log.iter().position(|entry| entry == "stop").unwrap();
    let destroy = log.iter().position(|entry| entry == "destroy").unwrap();
    let launch = log
        .iter()
        .position(|entry| entry == "launch commodore_pet_lite")
        .unwrap();
    assert!(stop < destroy && destroy < launch);
    drop(log);

    assert_eq!(session.binding().unwrap().len(), 4);
    assert_eq!(session.ui().open_panels, PanelKind::STARTUP.to_vec());
    assert_eq!(session.refresh_state().last_tick, None);
    // the first reading after the switch cannot stall
    assert_eq!(session.tick(), TickOutcome::Refreshed);
}

#[test]
fn failed_launch_leaves_session_idle() {
    let journal = Journal::default();
    let mut session = session_with(&journal, |simulator| simulator.reject_launch = true);
    let err = session.switch_machine(MachineProfile::Lite).unwrap_err();
    assert!(matches!(err, SessionError::Launch { profile: MachineProfile::Lite, .. }));
    assert_eq!(session.state(), SessionState::Idle);
    assert!(!session.ui().timer_running);
    assert_eq!(session.tick(), TickOutcome::Inactive);
}

#[test]
fn hover_highlights_immediately_and_unhover_clears_all() {
    let (mut session, _) = running_session();
    session.tick();
    session.hover_signal("CLK1");
    let highlight = AppConfig::default().colors.highlight;
    assert_eq!(
        session.ui().styles.as_ref().unwrap().get("--sig-CLK1"),
        Some(highlight.as_str())
    );
    session.tick();
    assert_eq!(
        session.ui().styles.as_ref().unwrap().get("--sig-CLK1"),
        Some(highlight.as_str())
    );
    session.unhover_signal();
    let styles = session.ui().styles.as_ref().unwrap();
    assert!(styles.properties.is_empty());
}

#[test]
fn click_opens_details_and_sets_breakpoint() {
    let journal = Journal::default();
    let mut session = session_with(&journal, |simulator| {
        simulator.details.insert(
            "RESET".to_string(),
            SignalDetails {
                value: true,
                writer_name: Some("C5".to_string()),
            },
        );
    });
    session.switch_machine(MachineProfile::Full).unwrap();

    session.click_signal("UNKNOWN");
    assert!(session.ui().details.is_none());

    session.click_signal("RESET");
    assert!(session.ui().open_panels.contains(&PanelKind::SignalDetails));
    let (name, details) = session.ui().details.clone().unwrap();
    assert_eq!(name, "RESET");
    assert!(details.value);

    session.break_on_selected_signal();
    assert_eq!(session.ui().breakpoints, vec!["RESET"]);
    session.add_breakpoint("CLK1");
    assert_eq!(session.ui().breakpoints, vec!["RESET", "CLK1"]);
    session.remove_breakpoint("RESET");
    assert_eq!(session.ui().breakpoints, vec!["CLK1"]);
}

#[test]
fn malformed_screen_buffer_is_skipped() {
    let journal = Journal::default();
    let mut session = session_with(&journal, |simulator| simulator.display_pixels = vec![0; 15]);
    session.switch_machine(MachineProfile::Full).unwrap();
    assert_eq!(session.tick(), TickOutcome::Refreshed);
    assert_eq!(session.ui().screen_frames, 0);
    assert!(session.ui().last_clock.is_some());
}

#[test]
fn closed_panels_are_not_refreshed() {
    let (mut session, _) = running_session();
    session.close_panel(PanelKind::Cpu);
    session.close_panel(PanelKind::Screen);
    session.ui_mut().calls.clear();
    session.tick();
    assert_eq!(session.ui().count("cpu"), 0);
    assert_eq!(session.ui().count("screen"), 0);
    assert_eq!(session.ui().count("clock"), 1);
}

#[test]
fn keyboard_macro_plays_through_ticks() {
    let (mut session, _) = running_session();
    session.submit_keyboard_text("10");
    for _ in 0..40 {
        session.tick();
    }
    let pressed = &session.simulator().unwrap().pressed_keys;
    assert_eq!(
        pressed.as_slice(),
        [
            KeyPosition::new(6, 6),
            KeyPosition::new(8, 6),
            KeyPosition::new(6, 5)
        ]
    );
}

#[test]
fn shutdown_stops_simulator() {
    let (mut session, journal) = running_session();
    session.shutdown();
    assert_eq!(session.state(), SessionState::Idle);
    assert!(!session.ui().timer_running);
    assert!(session.ui().open_panels.is_empty());
    assert!(session.ui().viewport.is_none());
    let log = journal.borrow();
    assert_eq!(&log[log.len() - 2..], ["stop", "destroy"]);
}
