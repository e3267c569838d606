use lifegrid::GenerationStats;
use std::io::{self, Write};
use std::time::Instant;

pub trait Recorder {
    type Str: AsRef<str>;

    fn record(&mut self, stats: GenerationStats);

    fn has_report(&self) -> bool;
    fn report(&mut self) -> Self::Str;
}

pub struct SimpleRecord {
    latest: GenerationStats,
    gens_in_report: usize,
    last_report: Instant,
}
impl SimpleRecord {
    pub fn new(initial: GenerationStats) -> Self {
        Self {
            latest: initial,
            gens_in_report: 0,
            last_report: Instant::now(),
        }
    }
}
impl Recorder for SimpleRecord {
    type Str = String;

    fn record(&mut self, stats: GenerationStats) {
        self.gens_in_report += 1;
        self.latest = stats;
    }

    fn has_report(&self) -> bool {
        self.last_report.elapsed().as_millis() >= 500
    }
    fn report(&mut self) -> Self::Str {
        let gens_per_sec = self.gens_in_report as f64 / self.last_report.elapsed().as_secs_f64();
        // reset stats for next report
        self.last_report = Instant::now();
        self.gens_in_report = 0;

        let GenerationStats {
            generation,
            population,
            births,
            deaths,
        } = self.latest;
        format!("{gens_per_sec:.02}gen/s gen:{generation} pop:{population} +{births} -{deaths}")
    }
}

/// Keeps every recorded generation with the time it took
pub struct CsvRecord {
    inner: SimpleRecord,
    data: Vec<(u128, GenerationStats)>,
    last: Instant,
}
impl CsvRecord {
    pub fn new(initial: GenerationStats) -> Self {
        Self {
            inner: SimpleRecord::new(initial),
            data: Vec::new(),
            last: Instant::now(),
        }
    }

    fn write_to<W: Write>(&self, mut out: W) -> io::Result<()> {
        out.write_all(b"gen,delta_us,population,births,deaths\n")?;
        for (delta, stats) in &self.data {
            writeln!(
                out,
                "{},{},{},{},{}",
                stats.generation, delta, stats.population, stats.births, stats.deaths
            )?;
        }
        out.flush()
    }

    pub fn save<P: AsRef<std::path::Path>>(&self, path: P) -> io::Result<()> {
        let file = std::fs::File::create(path)?;
        self.write_to(io::BufWriter::new(file))
    }
}
impl Recorder for CsvRecord {
    type Str = <SimpleRecord as Recorder>::Str;

    fn record(&mut self, stats: GenerationStats) {
        let delta = self.last.elapsed().as_micros();
        self.last = Instant::now();

        self.data.push((delta, stats));
        self.inner.record(stats);
    }

    fn has_report(&self) -> bool {
        self.inner.has_report()
    }
    fn report(&mut self) -> Self::Str {
        self.inner.report()
    }
}

pub enum SwitchRecorder {
    Csv(CsvRecord),
    Simple(SimpleRecord),
}
impl SwitchRecorder {
    pub fn new(initial: GenerationStats, csv: bool) -> Self {
        if csv {
            Self::Csv(CsvRecord::new(initial))
        } else {
            Self::Simple(SimpleRecord::new(initial))
        }
    }
    pub fn save<P: AsRef<std::path::Path>>(&self, path: P) -> io::Result<()> {
        match self {
            Self::Csv(r) => r.save(path),
            Self::Simple(_) => Err(io::Error::other("statistics were not recorded")),
        }
    }
}
impl Recorder for SwitchRecorder {
    type Str = String;

    fn record(&mut self, stats: GenerationStats) {
        match self {
            Self::Csv(r) => r.record(stats),
            Self::Simple(r) => r.record(stats),
        }
    }
    fn has_report(&self) -> bool {
        match self {
            Self::Csv(r) => r.has_report(),
            Self::Simple(r) => r.has_report(),
        }
    }
    fn report(&mut self) -> Self::Str {
        match self {
            Self::Csv(r) => r.report(),
            Self::Simple(r) => r.report(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(generation: u64, population: u32) -> GenerationStats {
        GenerationStats {
            generation,
            population,
            births: 2,
            deaths: 1,
        }
    }

    #[test]
    fn csv_has_a_row_per_generation() {
        let mut record = CsvRecord::new(stats(0, 5));
        record.record(stats(1, 6));
        record.record(stats(2, 7));

        let mut out = Vec::new();
        record.write_to(&mut out).expect("write to memory");
        let text = String::from_utf8(out).expect("utf8 csv");
        let lines = text.lines().collect::<Vec<_>>();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "gen,delta_us,population,births,deaths");
        assert!(lines[2].starts_with("2,"));
        assert!(lines[2].ends_with(",7,2,1"));
    }

    #[test]
    fn report_shows_the_latest_generation() {
        let mut record = SimpleRecord::new(stats(0, 5));
        record.record(stats(1, 9));
        assert!(record.report().ends_with("gen:1 pop:9 +2 -1"));
    }

    #[test]
    fn only_csv_records_can_be_saved() {
        let record = SwitchRecorder::new(stats(0, 0), false);
        assert!(record.save(std::env::temp_dir().join("unused.csv")).is_err());
    }
}
