//! Spinner slots for providers syncing concurrently.
//!
//! Each running sync claims a slot keyed by its index in the run list and
//! releases it when the sync finishes.

use std::collections::HashMap;
use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};

const TICK: Duration = Duration::from_millis(100);

pub struct SpinnerPool {
    mp: MultiProgress,
    spinners: Vec<ProgressBar>,
    slot_assignments: HashMap<usize, usize>,
    free_slots: Vec<usize>,
}

impl SpinnerPool {
    /// Create a pool with `n` slots. When `quiet` is true, nothing is drawn.
    pub fn new(n: usize, quiet: bool) -> Self {
        let mp = if quiet {
            MultiProgress::with_draw_target(ProgressDrawTarget::hidden())
        } else {
            MultiProgress::new()
        };

        let style = ProgressStyle::with_template("  {spinner:.cyan} {prefix:.bold} {msg}")
            .expect("static pattern")
            .tick_chars("/-\\|");

        let spinners = (0..n)
            .map(|_| {
                let pb = mp.add(ProgressBar::new_spinner());
                pb.set_style(style.clone());
                pb
            })
            .collect();

        Self {
            mp,
            spinners,
            slot_assignments: HashMap::new(),
            free_slots: (0..n).rev().collect(),
        }
    }

    /// Claim a slot for `key`, labelled with `prefix`. No-op when the pool is full.
    pub fn claim(&mut self, key: usize, prefix: &str, msg: String) {
        if let Some(slot) = self.free_slots.pop() {
            let pb = &self.spinners[slot];
            pb.reset();
            pb.set_prefix(prefix.to_string());
            pb.set_message(msg);
            pb.enable_steady_tick(TICK);
            self.slot_assignments.insert(key, slot);
        }
    }

    pub fn update(&self, key: usize, msg: String) {
        if let Some(&slot) = self.slot_assignments.get(&key) {
            self.spinners[slot].set_message(msg);
        }
    }

    /// Stop the spinner for `key`, clear its line, and free the slot.
    pub fn release(&mut self, key: usize) {
        if let Some(slot) = self.slot_assignments.remove(&key) {
            let pb = &self.spinners[slot];
            pb.disable_steady_tick();
            pb.set_message("");
            pb.finish_and_clear();
            self.free_slots.push(slot);
        }
    }

    /// Hide the spinners while `f` writes to the terminal.
    pub fn suspend<F: FnOnce() -> R, R>(&self, f: F) -> R {
        self.mp.suspend(f)
    }

    pub fn clear_all(&mut self) {
        for spinner in &self.spinners {
            spinner.disable_steady_tick();
            spinner.finish_and_clear();
        }
        self.slot_assignments.clear();
        self.free_slots = (0..self.spinners.len()).rev().collect();
    }
}
