use std::time::Duration;

/// Receives transfer progress after every round trip.
pub trait Progress {
    fn update(&mut self, done: u64, total: u64, elapsed: Duration);

    fn finish(&mut self) {}
}

pub fn render_line(done: u64, total: u64, elapsed_secs: f32) -> String {
    let percent = match total {
        0 => 100.0,
        _ => done as f64 * 100.0 / total as f64,
    };
    format!(
        "{}/{} bytes | {:.02} s | {:.02} % done",
        done, total, elapsed_secs, percent
    )
}

/// Terminal progress bar.
pub struct Bar(indicatif::ProgressBar);

impl Bar {
    pub fn new() -> Self {
        let bar = indicatif::ProgressBar::new(0);
        if let Ok(style) = indicatif::ProgressStyle::with_template("{msg} [{wide_bar}]") {
            bar.set_style(style.progress_chars("#  "));
        }
        Self(bar)
    }
}

impl Progress for Bar {
    fn update(&mut self, done: u64, total: u64, elapsed: Duration) {
        self.0.set_length(total);
        self.0.set_position(done);
        self.0
            .set_message(render_line(done, total, elapsed.as_secs_f32()));
    }

    fn finish(&mut self) {
        self.0.finish();
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;

    pub struct Silent;

    impl Progress for Silent {
        fn update(&mut self, _done: u64, _total: u64, _elapsed: Duration) {}
    }

    /// Keeps every update for inspection.
    #[derive(Default)]
    pub struct Recorder {
        pub updates: Vec<(u64, u64)>,
        pub finished: bool,
    }

    impl Progress for Recorder {
        fn update(&mut self, done: u64, total: u64, _elapsed: Duration) {
            self.updates.push((done, total));
        }

        fn finish(&mut self) {
            self.finished = true;
        }
    }

    #[test]
    fn line() {
        assert_eq!(
            render_line(512, 1024, 1.5),
            "512/1024 bytes | 1.50 s | 50.00 % done"
        );
        assert_eq!(
            render_line(1000, 1000, 0.0),
            "1000/1000 bytes | 0.00 s | 100.00 % done"
        );
        assert_eq!(render_line(0, 0, 0.25), "0/0 bytes | 0.25 s | 100.00 % done");
        assert_eq!(
            render_line(1, 3, 12.345),
            "1/3 bytes | 12.35 s | 33.33 % done"
        );
    }
}
