//! Cycle-level simulation kernel with a clock event queue.
//!
//! [`SimKernel`] hosts one [`Device`] and any number of free-running clocks.
//! Time only advances inside [`SignalAccess::wait`]: the kernel pops clock
//! toggles from its queue, evaluates the device on each rising edge of its
//! clock, and returns as soon as the caller's trigger fires.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use vigil_common::{Logic, SimTime};

use crate::access::{SignalAccess, Trigger, WaitOutcome};
use crate::device::{Device, Pins};
use crate::error::SimError;
use crate::value::{EdgeKind, PortDirection, SimSignalId, SimSignalState};
use crate::waveform::WaveformRecorder;

/// A scheduled clock toggle.
#[derive(Debug, Clone)]
struct ClockEvent {
    /// When the toggle happens.
    time: SimTime,
    /// Insertion order, so toggles at equal times pop first-in first-out.
    seq: u64,
    /// The clock signal.
    signal: SimSignalId,
}

impl PartialEq for ClockEvent {
    fn eq(&self, other: &Self) -> bool {
        self.time == other.time && self.seq == other.seq
    }
}

impl Eq for ClockEvent {}

impl PartialOrd for ClockEvent {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ClockEvent {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.time
            .cmp(&other.time)
            .then_with(|| self.seq.cmp(&other.seq))
    }
}

/// A trigger with its signal names resolved to ids.
#[derive(Debug, Clone, Copy)]
enum Armed {
    Edge { signal: SimSignalId, kind: EdgeKind },
    Cycles { clock: SimSignalId, remaining: u64 },
    Until(SimTime),
}

impl Armed {
    /// Feeds one value change to the trigger; returns `true` once it fires.
    fn observe(&mut self, signal: SimSignalId, edge: EdgeKind) -> bool {
        match self {
            Armed::Edge { signal: s, kind } => *s == signal && *kind == edge,
            Armed::Cycles { clock, remaining } => {
                if *clock == signal && edge == EdgeKind::Rising {
                    *remaining = remaining.saturating_sub(1);
                    *remaining == 0
                } else {
                    false
                }
            }
            Armed::Until(_) => false,
        }
    }
}

/// The simulation kernel: signal table, clock queue, and the hosted device.
pub struct SimKernel {
    /// Current simulation time.
    now: SimTime,
    /// Next insertion sequence number for the queue.
    seq: u64,
    /// Min-heap of pending clock toggles.
    queue: BinaryHeap<Reverse<ClockEvent>>,
    /// All signals, indexed by [`SimSignalId`].
    signals: Vec<SimSignalState>,
    by_name: HashMap<String, SimSignalId>,
    device: Box<dyn Device>,
    /// The port whose rising edge evaluates the device.
    device_clock: SimSignalId,
    /// Half period of every running clock.
    clocks: HashMap<SimSignalId, SimTime>,
    /// A rising edge of the device clock was handed to the caller before
    /// the device evaluated it.
    pending_eval: bool,
    /// Drives issued while an evaluation is pending.
    deferred: Vec<(SimSignalId, Logic)>,
    evaluations: u64,
    recorder: Option<Box<dyn WaveformRecorder>>,
}

impl SimKernel {
    /// Creates a kernel hosting `device`, with every port at its power-up value.
    pub fn new(device: Box<dyn Device>) -> Result<Self, SimError> {
        let mut signals = Vec::new();
        let mut by_name = HashMap::new();
        for port in device.ports() {
            if by_name.contains_key(&port.name) {
                return Err(SimError::DuplicatePort { name: port.name });
            }
            let id = SimSignalId::from_raw(signals.len() as u32);
            by_name.insert(port.name.clone(), id);
            signals.push(SimSignalState {
                name: port.name,
                value: port.initial,
                direction: port.direction,
            });
        }

        let clock_name = device.clock_port();
        let device_clock = match by_name.get(clock_name) {
            Some(&id) if signals[id.index()].direction == PortDirection::Input => id,
            Some(_) => {
                return Err(SimError::NotDrivable {
                    name: clock_name.to_string(),
                })
            }
            None => {
                return Err(SimError::UnknownSignal {
                    name: clock_name.to_string(),
                })
            }
        };

        tracing::debug!(
            device = device.name(),
            ports = signals.len(),
            "simulation kernel created"
        );

        Ok(Self {
            now: SimTime::zero(),
            seq: 0,
            queue: BinaryHeap::new(),
            signals,
            by_name,
            device,
            device_clock,
            clocks: HashMap::new(),
            pending_eval: false,
            deferred: Vec::new(),
            evaluations: 0,
            recorder: None,
        })
    }

    /// Attaches a waveform recorder and dumps the current value of every port.
    pub fn set_recorder(&mut self, mut recorder: Box<dyn WaveformRecorder>) -> Result<(), SimError> {
        recorder.begin_scope(self.device.name())?;
        for (i, sig) in self.signals.iter().enumerate() {
            recorder.register_signal(SimSignalId::from_raw(i as u32), &sig.name)?;
        }
        recorder.end_scope()?;
        for (i, sig) in self.signals.iter().enumerate() {
            recorder.record_change(self.now.fs, SimSignalId::from_raw(i as u32), sig.value)?;
        }
        self.recorder = Some(recorder);
        Ok(())
    }

    /// Looks up a signal id by port name.
    pub fn find_signal(&self, name: &str) -> Option<SimSignalId> {
        self.by_name.get(name).copied()
    }

    /// Returns the number of signals.
    pub fn signal_count(&self) -> usize {
        self.signals.len()
    }

    /// Returns how many times the device has been evaluated.
    pub fn evaluations(&self) -> u64 {
        self.evaluations
    }

    fn lookup(&self, name: &str) -> Result<SimSignalId, SimError> {
        self.find_signal(name).ok_or_else(|| SimError::UnknownSignal {
            name: name.to_string(),
        })
    }

    /// Sets a signal and records the change; returns the edge it produced.
    fn apply(&mut self, id: SimSignalId, value: Logic) -> Result<Option<EdgeKind>, SimError> {
        let sig = &mut self.signals[id.index()];
        let edge = EdgeKind::classify(sig.value, value);
        if edge.is_some() {
            sig.value = value;
            if let Some(rec) = &mut self.recorder {
                rec.record_change(self.now.fs, id, value)?;
            }
        }
        Ok(edge)
    }

    /// Evaluates the device for the last rising edge of its clock, then
    /// applies drives that were held back while the evaluation was pending.
    ///
    /// Returns `true` if any resulting change fires `armed`.
    fn evaluate(&mut self, armed: &mut Armed) -> Result<bool, SimError> {
        let writes = {
            let mut pins = Pins::new(&self.by_name, &self.signals);
            self.device.on_rising_edge(&mut pins);
            pins.into_writes()
        };
        self.pending_eval = false;
        self.evaluations += 1;

        let mut fired = false;
        for (id, value) in writes {
            if self.signals[id.index()].direction != PortDirection::Output {
                continue;
            }
            if let Some(edge) = self.apply(id, value)? {
                fired |= armed.observe(id, edge);
            }
        }
        for (id, value) in std::mem::take(&mut self.deferred) {
            self.apply(id, value)?;
        }
        Ok(fired)
    }

    fn arm(&self, trigger: &Trigger<'_>) -> Result<Armed, SimError> {
        Ok(match *trigger {
            Trigger::RisingEdge(name) => Armed::Edge {
                signal: self.lookup(name)?,
                kind: EdgeKind::Rising,
            },
            Trigger::FallingEdge(name) => Armed::Edge {
                signal: self.lookup(name)?,
                kind: EdgeKind::Falling,
            },
            Trigger::ClockCycles { clock, count } => Armed::Cycles {
                clock: self.lookup(clock)?,
                remaining: count,
            },
            Trigger::Timer(span) => Armed::Until(self.now.saturating_add(span)),
        })
    }

    fn time_out(&mut self, deadline: SimTime) -> WaitOutcome {
        self.now = self.now.max(deadline);
        WaitOutcome::TimedOut
    }
}

impl SignalAccess for SimKernel {
    fn now(&self) -> SimTime {
        self.now
    }

    fn read(&self, signal: &str) -> Result<Logic, SimError> {
        let id = self.lookup(signal)?;
        Ok(self.signals[id.index()].value)
    }

    fn drive(&mut self, signal: &str, value: Logic) -> Result<(), SimError> {
        let id = self.lookup(signal)?;
        if self.signals[id.index()].direction == PortDirection::Output {
            return Err(SimError::NotDrivable {
                name: signal.to_string(),
            });
        }
        if self.pending_eval {
            self.deferred.push((id, value));
        } else {
            self.apply(id, value)?;
        }
        Ok(())
    }

    /// Flushes and detaches the waveform recorder, if any.
    fn finish(&mut self) -> Result<(), SimError> {
        if let Some(mut rec) = self.recorder.take() {
            rec.finalize()?;
        }
        Ok(())
    }

    fn start_clock(&mut self, signal: &str, period: SimTime) -> Result<(), SimError> {
        let id = self.lookup(signal)?;
        if self.signals[id.index()].direction == PortDirection::Output {
            return Err(SimError::NotDrivable {
                name: signal.to_string(),
            });
        }
        if self.clocks.contains_key(&id) {
            return Err(SimError::ClockAlreadyRunning {
                name: signal.to_string(),
            });
        }
        if period.fs == 0 || !period.fs.is_multiple_of(2) {
            return Err(SimError::InvalidPeriod {
                name: signal.to_string(),
                period_fs: period.fs,
            });
        }

        let half = SimTime::from_fs(period.fs / 2);
        self.clocks.insert(id, half);
        self.apply(id, Logic::Zero)?;
        self.queue.push(Reverse(ClockEvent {
            time: self.now + half,
            seq: self.seq,
            signal: id,
        }));
        self.seq += 1;
        tracing::debug!(clock = signal, %period, "clock started");
        Ok(())
    }

    fn wait(
        &mut self,
        trigger: &Trigger<'_>,
        deadline: Option<SimTime>,
    ) -> Result<WaitOutcome, SimError> {
        let mut armed = self.arm(trigger)?;
        if let Armed::Cycles { remaining: 0, .. } = armed {
            return Ok(WaitOutcome::Fired);
        }

        if self.pending_eval && self.evaluate(&mut armed)? {
            return Ok(WaitOutcome::Fired);
        }

        loop {
            let next = self.queue.peek().map(|Reverse(ev)| ev.time);

            if let Armed::Until(target) = armed {
                if next.is_none_or(|t| t >= target) {
                    if let Some(d) = deadline.filter(|d| *d < target) {
                        return Ok(self.time_out(d));
                    }
                    self.now = target;
                    return Ok(WaitOutcome::Fired);
                }
            }

            match (next, deadline) {
                (None, None) => {
                    return Err(SimError::Stalled {
                        time_fs: self.now.fs,
                    })
                }
                (None, Some(d)) => return Ok(self.time_out(d)),
                (Some(t), Some(d)) if t > d => return Ok(self.time_out(d)),
                _ => {}
            }

            let Some(Reverse(event)) = self.queue.pop() else {
                continue;
            };
            self.now = event.time;
            let new_value = match self.signals[event.signal.index()].value {
                Logic::One => Logic::Zero,
                _ => Logic::One,
            };
            let edge = self.apply(event.signal, new_value)?;
            if let Some(&half) = self.clocks.get(&event.signal) {
                self.queue.push(Reverse(ClockEvent {
                    time: event.time + half,
                    seq: self.seq,
                    signal: event.signal,
                }));
                self.seq += 1;
            }

            let Some(edge) = edge else { continue };
            let fired = armed.observe(event.signal, edge);

            if event.signal == self.device_clock && edge == EdgeKind::Rising {
                self.pending_eval = true;
                if fired {
                    return Ok(WaitOutcome::Fired);
                }
                if self.evaluate(&mut armed)? {
                    return Ok(WaitOutcome::Fired);
                }
            } else if fired {
                return Ok(WaitOutcome::Fired);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::PortDecl;
    use crate::waveform::VcdRecorder;
    use std::cell::RefCell;
    use std::io::Write;
    use std::rc::Rc;

    /// `q` follows `d` on every rising edge; `t` toggles while `en` is high.
    struct Flop {
        t: bool,
    }

    impl Device for Flop {
        fn name(&self) -> &str {
            "flop"
        }

        fn ports(&self) -> Vec<PortDecl> {
            vec![
                PortDecl::input("clk"),
                PortDecl::input("d"),
                PortDecl::input("en"),
                PortDecl::output("q", Logic::X),
                PortDecl::output("t", Logic::Zero),
            ]
        }

        fn clock_port(&self) -> &str {
            "clk"
        }

        fn on_rising_edge(&mut self, pins: &mut Pins<'_>) {
            let d = pins.read("d");
            pins.write("q", d);
            if pins.read("en") == Logic::One {
                self.t = !self.t;
                pins.write("t", Logic::from(self.t));
            }
        }
    }

    fn kernel() -> SimKernel {
        SimKernel::new(Box::new(Flop { t: false })).unwrap()
    }

    fn clocked() -> SimKernel {
        let mut k = kernel();
        k.drive("d", Logic::Zero).unwrap();
        k.drive("en", Logic::Zero).unwrap();
        k.start_clock("clk", SimTime::from_ns(40)).unwrap();
        k
    }

    struct Dup;

    impl Device for Dup {
        fn name(&self) -> &str {
            "dup"
        }
        fn ports(&self) -> Vec<PortDecl> {
            vec![PortDecl::input("clk"), PortDecl::input("clk")]
        }
        fn clock_port(&self) -> &str {
            "clk"
        }
        fn on_rising_edge(&mut self, _pins: &mut Pins<'_>) {}
    }

    #[test]
    fn construction_initial_values() {
        let k = kernel();
        assert_eq!(k.signal_count(), 5);
        assert_eq!(k.now(), SimTime::zero());
        assert_eq!(k.read("d").unwrap(), Logic::X);
        assert_eq!(k.read("t").unwrap(), Logic::Zero);
        assert!(k.find_signal("q").is_some());
    }

    #[test]
    fn duplicate_port_rejected() {
        assert!(matches!(
            SimKernel::new(Box::new(Dup)),
            Err(SimError::DuplicatePort { .. })
        ));
    }

    #[test]
    fn unknown_signal_errors() {
        let mut k = kernel();
        assert!(matches!(k.read("nope"), Err(SimError::UnknownSignal { .. })));
        assert!(matches!(
            k.drive("nope", Logic::One),
            Err(SimError::UnknownSignal { .. })
        ));
    }

    #[test]
    fn outputs_cannot_be_driven() {
        let mut k = kernel();
        assert!(matches!(
            k.drive("q", Logic::One),
            Err(SimError::NotDrivable { .. })
        ));
    }

    #[test]
    fn clock_validation() {
        let mut k = kernel();
        assert!(matches!(
            k.start_clock("clk", SimTime::from_fs(3)),
            Err(SimError::InvalidPeriod { period_fs: 3, .. })
        ));
        k.start_clock("clk", SimTime::from_ns(40)).unwrap();
        assert!(matches!(
            k.start_clock("clk", SimTime::from_ns(40)),
            Err(SimError::ClockAlreadyRunning { .. })
        ));
    }

    #[test]
    fn cycles_advance_by_period() {
        let mut k = clocked();
        k.await_cycles("clk", 1).unwrap();
        assert_eq!(k.now(), SimTime::from_ns(20));
        k.await_cycles("clk", 3).unwrap();
        assert_eq!(k.now(), SimTime::from_ns(140));
        assert_eq!(k.read("clk").unwrap(), Logic::One);
    }

    #[test]
    fn zero_cycles_returns_immediately() {
        let mut k = clocked();
        k.await_cycles("clk", 0).unwrap();
        assert_eq!(k.now(), SimTime::zero());
    }

    #[test]
    fn resumed_caller_sees_pre_edge_values() {
        let mut k = clocked();
        k.drive("en", Logic::One).unwrap();
        k.await_cycles("clk", 1).unwrap();
        assert_eq!(k.read("t").unwrap(), Logic::Zero);
        k.await_duration(SimTime::from_ns(1)).unwrap();
        assert_eq!(k.read("t").unwrap(), Logic::One);
        assert_eq!(k.evaluations(), 1);
    }

    #[test]
    fn drives_at_an_edge_apply_to_the_next_edge() {
        let mut k = clocked();
        k.await_cycles("clk", 1).unwrap();
        k.drive("d", Logic::One).unwrap();
        assert_eq!(k.read("d").unwrap(), Logic::Zero);
        k.await_duration(SimTime::from_ns(1)).unwrap();
        assert_eq!(k.read("d").unwrap(), Logic::One);
        assert_eq!(k.read("q").unwrap(), Logic::Zero);
        k.await_cycles("clk", 1).unwrap();
        k.await_duration(SimTime::from_ns(1)).unwrap();
        assert_eq!(k.read("q").unwrap(), Logic::One);
    }

    #[test]
    fn output_edge_wakes_after_evaluation() {
        let mut k = clocked();
        k.drive("en", Logic::One).unwrap();
        k.await_rising_edge("t").unwrap();
        assert_eq!(k.now(), SimTime::from_ns(20));
        assert_eq!(k.read("t").unwrap(), Logic::One);
        k.await_falling_edge("t").unwrap();
        assert_eq!(k.now(), SimTime::from_ns(60));
    }

    #[test]
    fn pending_evaluation_can_fire_next_wait() {
        let mut k = clocked();
        k.drive("en", Logic::One).unwrap();
        k.await_cycles("clk", 1).unwrap();
        k.await_rising_edge("t").unwrap();
        assert_eq!(k.now(), SimTime::from_ns(20));
    }

    #[test]
    fn timer_stops_before_events_at_target() {
        let mut k = clocked();
        k.await_duration(SimTime::from_ns(20)).unwrap();
        assert_eq!(k.now(), SimTime::from_ns(20));
        assert_eq!(k.read("clk").unwrap(), Logic::Zero);
        k.await_cycles("clk", 1).unwrap();
        assert_eq!(k.now(), SimTime::from_ns(20));
    }

    #[test]
    fn timer_without_clock_does_not_stall() {
        let mut k = kernel();
        k.await_duration(SimTime::from_ns(10)).unwrap();
        assert_eq!(k.now(), SimTime::from_ns(10));
    }

    #[test]
    fn deadline_times_out_at_deadline() {
        let mut k = clocked();
        let outcome = k
            .wait(&Trigger::RisingEdge("t"), Some(SimTime::from_ns(200)))
            .unwrap();
        assert_eq!(outcome, WaitOutcome::TimedOut);
        assert_eq!(k.now(), SimTime::from_ns(200));
    }

    #[test]
    fn deadline_shorter_than_timer() {
        let mut k = clocked();
        let outcome = k
            .wait(
                &Trigger::Timer(SimTime::from_ns(500)),
                Some(SimTime::from_ns(100)),
            )
            .unwrap();
        assert_eq!(outcome, WaitOutcome::TimedOut);
        assert_eq!(k.now(), SimTime::from_ns(100));
    }

    #[test]
    fn wait_without_events_stalls() {
        let mut k = kernel();
        assert!(matches!(
            k.await_rising_edge("t"),
            Err(SimError::Stalled { time_fs: 0 })
        ));
    }

    #[derive(Clone, Default)]
    struct SharedBuf(Rc<RefCell<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.borrow_mut().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn recorder_captures_clock_and_outputs() {
        let buf = SharedBuf::default();
        let mut k = kernel();
        k.set_recorder(Box::new(VcdRecorder::new(buf.clone()))).unwrap();
        k.drive("en", Logic::One).unwrap();
        k.drive("d", Logic::Zero).unwrap();
        k.start_clock("clk", SimTime::from_ns(40)).unwrap();
        k.await_cycles("clk", 2).unwrap();
        k.finish().unwrap();

        let out = String::from_utf8(buf.0.borrow().clone()).unwrap();
        assert!(out.contains("$scope module flop $end"));
        assert!(out.contains("$var wire 1 ! clk $end"));
        assert!(out.contains("#20000000\n"));
        assert!(out.contains("#60000000\n"));
    }
}
