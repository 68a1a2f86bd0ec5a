use std::time::Instant;

/// Logs phase progress at every 10% step and once on completion.
#[derive(Debug)]
pub struct Progress {
    label: &'static str,
    total: usize,
    done: usize,
    last_step: usize,
    started: Instant,
}

impl Progress {
    pub fn new(label: &'static str, total: usize) -> Self {
        tracing::info!("🔄 {}: 0/{}", label, total);
        Self {
            label,
            total,
            done: 0,
            last_step: 0,
            started: Instant::now(),
        }
    }

    pub fn tick(&mut self) {
        self.done += 1;
        if self.total == 0 {
            return;
        }

        let step = self.done * 10 / self.total;
        if step > self.last_step {
            self.last_step = step;
            tracing::info!(
                "🔄 {}: {}/{} ({}%) in {:.1}s",
                self.label,
                self.done,
                self.total,
                self.done * 100 / self.total,
                self.started.elapsed().as_secs_f64()
            );
        }
    }

    pub fn done(&self) -> usize {
        self.done
    }

    pub fn finish(self) {
        tracing::info!(
            "✅ {} finished: {}/{} in {:.1}s",
            self.label,
            self.done,
            self.total,
            self.started.elapsed().as_secs_f64()
        );
    }
}
