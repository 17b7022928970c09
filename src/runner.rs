//! This module executes a [`Program`] according to a [`Config`] and summarizes every
//! machine in a [`Report`].
//!
//! Deterministic programs run one [`TuringMachine`] per tape on a pool of scoped worker
//! threads. Non-deterministic programs run a single [`NonDeterministicMachine`]. Progress is
//! reported to an [`Observer`] as it happens.

use serde::Serialize;
use std::panic;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use tracing::{debug, info, warn};

use crate::analyzer::{self, AnalysisWarning};
use crate::config::Config;
use crate::machine::TuringMachine;
use crate::ndtm::NonDeterministicMachine;
use crate::tape::Tape;
use crate::types::{
    Mode, Outcome, Program, Status, TapeDefinition, TuringMachineError, ValidationError, Verdict,
};

/// Receives progress notifications from a run.
///
/// Deterministic runs call the observer from several worker threads at once, hence `Sync`.
/// Every method defaults to doing nothing.
pub trait Observer: Sync {
    /// A machine is about to take its first step on `tape`.
    fn on_start(&self, _index: usize, _tape: &Tape) {}

    /// A machine took a step. Only called for verbose runs.
    fn on_step(&self, _index: usize, _tape: &Tape, _status: Status) {}

    /// A machine reached its final verdict.
    fn on_finish(&self, _index: usize, _verdict: Verdict) {}
}

/// An observer that ignores every notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct Silent;

impl Observer for Silent {}

/// The final state of one machine, or of one NDTM instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MachineReport {
    pub index: usize,
    pub verdict: Verdict,
    /// The name of the state the machine ended in.
    pub state: String,
    pub tape: String,
    pub head: usize,
    pub steps: usize,
}

impl MachineReport {
    fn new(index: usize, verdict: Verdict, state: &str, tape: &Tape, steps: usize) -> Self {
        Self {
            index,
            verdict,
            state: state.to_string(),
            tape: tape.to_string(),
            head: tape.head(),
            steps,
        }
    }
}

/// The summary of a whole run. Machines are sorted by index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub mode: Mode,
    /// Whether any machine accepted.
    pub accepted: bool,
    pub machines: Vec<MachineReport>,
}

impl Report {
    fn new(mode: Mode, machines: Vec<MachineReport>) -> Self {
        Self {
            mode,
            accepted: machines
                .iter()
                .any(|machine| machine.verdict == Verdict::Accepted),
            machines,
        }
    }

    /// Machines that reached an accept state.
    pub fn accepting(&self) -> impl Iterator<Item = &MachineReport> {
        self.machines
            .iter()
            .filter(|machine| machine.verdict == Verdict::Accepted)
    }

    pub fn to_json(&self) -> Result<String, TuringMachineError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| TuringMachineError::Serialization(e.to_string()))
    }
}

/// Runs `program` as configured by `config`, reporting progress to `observer`.
///
/// # Returns
///
/// * `Ok(Report)` once every machine has a verdict. Rejection is a verdict, not an error.
/// * `Err(TuringMachineError::Validation)` if the program cannot run in the requested mode:
///   an ambiguous transition under `strict`, or several tapes in non-deterministic mode.
pub fn run<O: Observer>(
    program: &Program,
    config: &Config,
    observer: &O,
) -> Result<Report, TuringMachineError> {
    info!(mode = ?config.mode, tapes = program.tapes.len(), "running program");

    match config.mode {
        Mode::Deterministic => run_deterministic(program, config, observer),
        Mode::NonDeterministic => run_non_deterministic(program, config, observer),
    }
}

fn run_deterministic<O: Observer>(
    program: &Program,
    config: &Config,
    observer: &O,
) -> Result<Report, TuringMachineError> {
    if config.strict {
        analyzer::check_deterministic(&program.automaton)?;
    }

    for warning in analyzer::analyze(&program.automaton) {
        warn!("{}", warning);
    }

    let jobs = config.jobs.clamp(1, program.tapes.len().max(1));
    let next = AtomicUsize::new(0);
    let stop = AtomicBool::new(false);

    debug!(jobs, "spawning workers");

    let results = thread::scope(|scope| {
        let workers: Vec<_> = (0..jobs)
            .map(|_| scope.spawn(|| worker(program, config, &next, &stop, observer)))
            .collect();

        workers
            .into_iter()
            .map(|handle| handle.join().unwrap_or_else(|payload| panic::resume_unwind(payload)))
            .collect::<Vec<_>>()
    });

    let mut slots: Vec<Option<MachineReport>> = vec![None; program.tapes.len()];
    for result in results {
        for report in result? {
            let index = report.index;
            slots[index] = Some(report);
        }
    }

    let machines = slots
        .into_iter()
        .zip(&program.tapes)
        .enumerate()
        .map(|(index, (slot, definition))| match slot {
            Some(report) => Ok(report),
            None => never_started(program, index, definition, observer),
        })
        .collect::<Result<Vec<_>, ValidationError>>()?;

    Ok(Report::new(Mode::Deterministic, machines))
}

/// Pulls tape indices until the work runs out or, with `first_accept`, someone accepts.
fn worker<O: Observer>(
    program: &Program,
    config: &Config,
    next: &AtomicUsize,
    stop: &AtomicBool,
    observer: &O,
) -> Result<Vec<MachineReport>, ValidationError> {
    let mut reports = Vec::new();

    loop {
        if config.first_accept && stop.load(Ordering::Acquire) {
            break;
        }

        let index = next.fetch_add(1, Ordering::Relaxed);
        let Some(definition) = program.tapes.get(index) else {
            break;
        };

        let machine = TuringMachine::new(Arc::clone(&program.automaton), definition.tape()?);
        reports.push(run_machine(index, machine, config, stop, observer));
    }

    Ok(reports)
}

fn run_machine<O: Observer>(
    index: usize,
    mut machine: TuringMachine,
    config: &Config,
    stop: &AtomicBool,
    observer: &O,
) -> MachineReport {
    observer.on_start(index, machine.tape());

    let verdict = loop {
        if config.first_accept && stop.load(Ordering::Acquire) {
            break Verdict::Stopped;
        }

        let status = machine.step();
        if config.verbose {
            observer.on_step(index, machine.tape(), status);
        }

        if status.is_terminal() {
            break Verdict::from(status);
        }
    };

    if verdict == Verdict::Accepted && config.first_accept {
        stop.store(true, Ordering::Release);
    }

    debug!(
        machine = index,
        ?verdict,
        steps = machine.step_count(),
        "machine finished"
    );
    observer.on_finish(index, verdict);

    MachineReport::new(
        index,
        verdict,
        machine.state_name(),
        machine.tape(),
        machine.step_count(),
    )
}

/// The report of a machine no worker picked up before the run was stopped.
fn never_started<O: Observer>(
    program: &Program,
    index: usize,
    definition: &TapeDefinition,
    observer: &O,
) -> Result<MachineReport, ValidationError> {
    let tape = definition.tape()?;
    let initial = program.automaton.state(program.automaton.initial_state());

    observer.on_finish(index, Verdict::Stopped);
    Ok(MachineReport::new(index, Verdict::Stopped, &initial.name, &tape, 0))
}

fn run_non_deterministic<O: Observer>(
    program: &Program,
    config: &Config,
    observer: &O,
) -> Result<Report, TuringMachineError> {
    let mut machine = NonDeterministicMachine::from_program(program)?;

    for warning in analyzer::analyze(&program.automaton) {
        match warning {
            AnalysisWarning::NonDeterministicChoice { .. } => debug!("{}", warning),
            _ => warn!("{}", warning),
        }
    }

    if let Some(root) = machine.instance(0) {
        observer.on_start(0, root.tape());
    }

    let outcome = machine.run_with(|visit, instance| {
        if config.verbose {
            observer.on_step(visit.instance, instance.tape(), visit.status);
        }
    });

    match outcome {
        Outcome::Accepted { instance } => info!(instance, "instance accepted"),
        Outcome::Rejected => info!(instances = machine.instances().len(), "every instance halted"),
    }

    let automaton = Arc::clone(machine.automaton());
    let machines = machine
        .instances()
        .iter()
        .enumerate()
        .map(|(index, instance)| {
            let verdict = Verdict::from(instance.status());
            observer.on_finish(index, verdict);
            MachineReport::new(
                index,
                verdict,
                &automaton.state(instance.state()).name,
                instance.tape(),
                instance.steps(),
            )
        })
        .collect();

    Ok(Report::new(Mode::NonDeterministic, machines))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use std::sync::Mutex;

    const EVEN_ZEROS: &str = "
initial_state=even
accept_states=accept
tape=0110
head=0
tape=000
head=0
even,0,0,>,odd
even,1,1,>,even
even,,,-,accept
odd,0,0,>,even
odd,1,1,>,odd
";

    const CONTAINS_11: &str = "
initial_state=scan
accept_states=found
tape=0101100
head=0
scan,0,0,>,scan
scan,1,1,>,scan
scan,1,1,>,one
one,1,1,-,found
";

    /// Accepts on tape `1`, walks right forever on tape `0`.
    const ACCEPT_OR_LOOP: &str = "
initial_state=S0
accept_states=ACC
tape=1
head=0
tape=0
head=0
tape=0
head=0
S0,1,1,-,ACC
S0,0,0,>,S0
S0,,,>,S0
";

    #[derive(Default)]
    struct Recorder {
        started: Mutex<Vec<usize>>,
        steps: AtomicUsize,
        finished: Mutex<Vec<(usize, Verdict)>>,
    }

    impl Observer for Recorder {
        fn on_start(&self, index: usize, _tape: &Tape) {
            self.started.lock().unwrap().push(index);
        }

        fn on_step(&self, _index: usize, _tape: &Tape, _status: Status) {
            self.steps.fetch_add(1, Ordering::Relaxed);
        }

        fn on_finish(&self, index: usize, verdict: Verdict) {
            self.finished.lock().unwrap().push((index, verdict));
        }
    }

    fn verdicts(report: &Report) -> Vec<Verdict> {
        report.machines.iter().map(|machine| machine.verdict).collect()
    }

    #[test]
    fn test_deterministic_run() {
        let program = parse(EVEN_ZEROS).unwrap();
        let report = run(&program, &Config::default(), &Silent).unwrap();

        assert_eq!(report.mode, Mode::Deterministic);
        assert!(report.accepted);
        assert_eq!(verdicts(&report), vec![Verdict::Accepted, Verdict::Halted]);

        let first = &report.machines[0];
        assert_eq!(first.state, "accept");
        assert_eq!(first.tape, "0110 ");
        assert_eq!(first.head, 4);
        assert_eq!(first.steps, 5);

        let second = &report.machines[1];
        assert_eq!(second.state, "odd");
        assert_eq!(second.head, 3);
    }

    #[test]
    fn test_jobs_do_not_change_results() {
        let program = parse(EVEN_ZEROS).unwrap();
        let single = run(&program, &Config::default(), &Silent).unwrap();

        for jobs in [2, 4, 16] {
            let config = Config::default().with_jobs(jobs);
            assert_eq!(run(&program, &config, &Silent).unwrap(), single);
        }
    }

    #[test]
    fn test_first_accept_stops_other_machines() {
        let program = parse(ACCEPT_OR_LOOP).unwrap();

        for jobs in [1, 3] {
            let config = Config::default().with_jobs(jobs).with_first_accept(true);
            let report = run(&program, &config, &Silent).unwrap();

            assert!(report.accepted);
            assert_eq!(
                verdicts(&report),
                vec![Verdict::Accepted, Verdict::Stopped, Verdict::Stopped]
            );
        }
    }

    #[test]
    fn test_never_started_machine_keeps_initial_tape() {
        let program = parse(ACCEPT_OR_LOOP).unwrap();
        let config = Config::default().with_first_accept(true);
        let report = run(&program, &config, &Silent).unwrap();

        let skipped = &report.machines[2];
        assert_eq!(skipped.state, "S0");
        assert_eq!(skipped.tape, "0");
        assert_eq!(skipped.steps, 0);
    }

    #[test]
    fn test_strict_rejects_ambiguous_program() {
        let input = "
tape=0
head=0
initial_state=S0
accept_states=A
S0,0,x,-,A
S0,0,y,-,B
";
        let program = parse(input).unwrap();

        let error = run(&program, &Config::default().with_strict(true), &Silent).unwrap_err();
        assert!(matches!(
            error,
            TuringMachineError::Validation(ValidationError::AmbiguousTransition { count: 2, .. })
        ));

        let report = run(&program, &Config::default(), &Silent).unwrap();
        assert_eq!(report.machines[0].tape, "x");
        assert!(report.accepted);
    }

    #[test]
    fn test_non_deterministic_run() {
        let program = parse(CONTAINS_11).unwrap();
        let config = Config::new(Mode::NonDeterministic);
        let report = run(&program, &config, &Silent).unwrap();

        assert_eq!(report.mode, Mode::NonDeterministic);
        assert!(report.accepted);
        assert_eq!(
            verdicts(&report),
            vec![
                Verdict::Stopped,
                Verdict::Halted,
                Verdict::Accepted,
                Verdict::Stopped
            ]
        );

        let winner: Vec<&MachineReport> = report.accepting().collect();
        assert_eq!(winner.len(), 1);
        assert_eq!(winner[0].state, "found");
        assert_eq!(winner[0].head, 4);
    }

    #[test]
    fn test_non_deterministic_rejection() {
        let program = parse(&CONTAINS_11.replace("tape=0101100", "tape=0101")).unwrap();
        let report = run(&program, &Config::new(Mode::NonDeterministic), &Silent).unwrap();

        assert!(!report.accepted);
        assert_eq!(report.machines.len(), 3);
        assert!(report
            .machines
            .iter()
            .all(|machine| machine.verdict == Verdict::Halted));
    }

    #[test]
    fn test_non_deterministic_requires_single_tape() {
        let program = parse(EVEN_ZEROS).unwrap();
        let error = run(&program, &Config::new(Mode::NonDeterministic), &Silent).unwrap_err();

        assert_eq!(
            error,
            TuringMachineError::Validation(ValidationError::MultipleNdtmTapes(2))
        );
    }

    #[test]
    fn test_observer_notifications() {
        let program = parse(EVEN_ZEROS).unwrap();

        let quiet = Recorder::default();
        run(&program, &Config::default(), &quiet).unwrap();
        assert_eq!(quiet.steps.load(Ordering::Relaxed), 0);

        let recorder = Recorder::default();
        run(&program, &Config::default().with_verbose(true), &recorder).unwrap();

        let mut started = recorder.started.lock().unwrap().clone();
        started.sort();
        assert_eq!(started, vec![0, 1]);

        // Applied steps plus the terminal one, for each machine.
        assert_eq!(recorder.steps.load(Ordering::Relaxed), 6 + 4);

        let mut finished = recorder.finished.lock().unwrap().clone();
        finished.sort_by_key(|(index, _)| *index);
        assert_eq!(finished, vec![(0, Verdict::Accepted), (1, Verdict::Halted)]);
    }

    #[test]
    fn test_report_to_json() {
        let program = parse(EVEN_ZEROS).unwrap();
        let report = run(&program, &Config::default(), &Silent).unwrap();
        let json = report.to_json().unwrap();

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["mode"], "Deterministic");
        assert_eq!(value["accepted"], true);
        assert_eq!(value["machines"][0]["verdict"], "Accepted");
        assert_eq!(value["machines"][1]["verdict"], "Halted");
        assert_eq!(value["machines"][1]["tape"], "000 ");
    }
}
