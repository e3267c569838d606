use std::str::FromStr;
use std::sync::LazyLock;
use std::time::Duration;

use lifegrid::{Axis, BoundedGrid, LtlRule, MooreRule, Neighbourhood, Pos2, Rule, Topology};
use regex::{Captures, Regex};
use thiserror::Error;

const DEFAULT_RULE: &str = "B3/S23";

static LIFE_RULE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^B([0-8]*)/S([0-8]*)(?:/[CG]?(\d+))?$").expect("life rule pattern")
});
static LTL_RULE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^R(\d+),C(\d+),M([01]),S(\d+)\.\.(\d+),B(\d+)\.\.(\d+)(?:,N([MNC]))?$")
        .expect("ltl rule pattern")
});
static BOUNDED_GRID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^([PTKCS])(\d+)(\*)?([+-]\d+)?(?:,(\d+)(\*)?([+-]\d+)?)?$")
        .expect("bounded grid pattern")
});

#[derive(Debug, Error)]
pub enum OptionsError {
    #[error(transparent)]
    Parse(#[from] getopts::Fail),
    #[error("invalid value {value:?} for --{name}")]
    InvalidValue { name: &'static str, value: String },
    #[error("unrecognised rule {0:?}")]
    Rule(String),
    #[error("unrecognised bounded grid {0:?}")]
    Topology(String),
    #[error("unknown fill mode {0:?}, expected random, alternating, all or empty")]
    FillMode(String),
    #[error("cannot read the terminal size")]
    Terminal(#[from] std::io::Error),
}

pub struct Args {
    matches: getopts::Matches,
}

impl Args {
    /// Parses `args`; `Ok(None)` means help was printed
    fn new<T: AsRef<str>>(args: &[T]) -> Result<Option<Self>, OptionsError> {
        let mut opts = getopts::Options::new();
        opts.optflag("", "help", "print this help menu");
        opts.optflag("c", "console", "run in console mode");
        opts.optopt("r", "rule", "rule, e.g. B3/S23, B2/S/3 or R2,C0,M1,S3..5,B3..4,NM", "RULE");
        opts.optopt("b", "bounded", "bounded grid, e.g. T64,64 or K40*,30", "GRID");
        opts.optopt("w", "width", "width of the starting fill", "WIDTH");
        opts.optopt("h", "height", "height of the starting fill", "HEIGHT");
        opts.optopt("f", "fill", "starting fill: random, alternating, all or empty", "TYPE");
        opts.optopt(
            "s",
            "sleep",
            "the amount of time to sleep between generations",
            "MILLIS",
        );
        opts.optopt("g", "gens", "max number of generations", "COUNT");
        opts.optopt("", "interval", "generations between snapshots", "COUNT");
        opts.optopt("", "rewind", "rewind to this generation after running", "GEN");
        opts.optopt("", "stats", "write stats csv to file", "FILE");

        let matches = opts.parse(args.iter().map(T::as_ref))?;
        if matches.opt_present("help") {
            println!("{}", opts.usage("usage: lifegrid [options]"));
            Ok(None)
        } else {
            Ok(Some(Self { matches }))
        }
    }
    pub fn from_env() -> Result<Option<Self>, OptionsError> {
        let env = std::env::args().collect::<Vec<_>>();
        Self::new(&env[1..])
    }

    fn get<T: FromStr>(&self, name: &'static str) -> Result<Option<T>, OptionsError> {
        self.matches
            .opt_str(name)
            .map(|value| {
                value
                    .parse()
                    .map_err(|_| OptionsError::InvalidValue { name, value })
            })
            .transpose()
    }

    pub fn console(&self) -> bool {
        self.matches.opt_present("console")
    }

    pub fn generations(&self) -> Result<u64, OptionsError> {
        // no limit unless asked for
        Ok(self.get("gens")?.unwrap_or(u64::MAX))
    }
    pub fn sleep(&self) -> Result<Option<Duration>, OptionsError> {
        Ok(match self.get("sleep")? {
            Some(millis) => Some(Duration::from_millis(millis)),
            None if self.console() => Some(Duration::from_millis(100)),
            None => None,
        })
    }
    pub fn interval(&self) -> Result<Option<u64>, OptionsError> {
        self.get("interval")
    }
    pub fn rewind(&self) -> Result<Option<u64>, OptionsError> {
        self.get("rewind")
    }

    pub fn grid_size(&self) -> Result<(i32, i32), OptionsError> {
        let default = if self.console() {
            let (cols, rows) = crossterm::terminal::size()?;
            (cols as i32, rows as i32)
        } else {
            (500, 500)
        };

        Ok((
            self.get("width")?.unwrap_or(default.0),
            self.get("height")?.unwrap_or(default.1),
        ))
    }
    pub fn fill_mode(&self) -> Result<FillMode, OptionsError> {
        self.matches
            .opt_str("fill")
            .as_deref()
            .unwrap_or("random")
            .parse()
    }

    pub fn rule_name(&self) -> String {
        self.matches
            .opt_str("rule")
            .unwrap_or_else(|| DEFAULT_RULE.to_string())
    }
    pub fn rule(&self) -> Result<Rule, OptionsError> {
        parse_rule(&self.rule_name())
    }
    pub fn bounded(&self) -> Result<Option<BoundedGrid>, OptionsError> {
        self.matches
            .opt_str("bounded")
            .map(|text| parse_bounded(&text))
            .transpose()
    }

    pub fn stats_file(&self) -> Option<String> {
        self.matches.opt_str("stats")
    }
}

/// Neighbour-count digits to a bit mask
fn counts(digits: &str) -> u16 {
    digits.bytes().fold(0, |mask, d| mask | 1 << (d - b'0'))
}

fn number<T: FromStr>(
    caps: &Captures,
    group: usize,
    source: &str,
    err: fn(String) -> OptionsError,
) -> Result<T, OptionsError> {
    caps.get(group)
        .map_or("", |m| m.as_str())
        .trim_start_matches('+')
        .parse()
        .map_err(|_| err(source.to_string()))
}

/// Parses `Bxx/Syy` (optionally `/Cn` for Generations) or the
/// `Rr,Cc,Mm,Sa..b,Ba..b,Nn` Larger than Life notation
pub fn parse_rule(rule: &str) -> Result<Rule, OptionsError> {
    let rule = rule.trim();
    if let Some(caps) = LIFE_RULE.captures(rule) {
        let moore = MooreRule::life_like(counts(&caps[1]), counts(&caps[2]));
        let states: u8 = match caps.get(3) {
            Some(_) => number(&caps, 3, rule, OptionsError::Rule)?,
            None => 2,
        };
        return Ok(match states {
            0..=2 => Rule::Life(moore),
            states => Rule::Generations { rule: moore, states },
        });
    }

    let caps = LTL_RULE
        .captures(rule)
        .ok_or_else(|| OptionsError::Rule(rule.to_string()))?;
    let neighbourhood = match caps.get(8).map(|m| m.as_str().to_ascii_uppercase()).as_deref() {
        Some("N") => Neighbourhood::VonNeumann,
        Some("C") => Neighbourhood::Circular,
        _ => Neighbourhood::Moore,
    };
    let range: u32 = number(&caps, 1, rule, OptionsError::Rule)?;
    if range == 0 {
        return Err(OptionsError::Rule(rule.to_string()));
    }
    let states: u8 = number(&caps, 2, rule, OptionsError::Rule)?;
    Ok(Rule::Ltl(LtlRule {
        range,
        states: states.max(2),
        include_middle: &caps[3] == "1",
        survival: (
            number(&caps, 4, rule, OptionsError::Rule)?,
            number(&caps, 5, rule, OptionsError::Rule)?,
        ),
        birth: (
            number(&caps, 6, rule, OptionsError::Rule)?,
            number(&caps, 7, rule, OptionsError::Rule)?,
        ),
        neighbourhood,
    }))
}

/// Parses `Xw[*][±s][,h[*][±s]]` where `X` is one of P (plane), T (torus),
/// K (Klein bottle), C (cross-surface) or S (sphere). A `*` marks the twisted
/// edge of a Klein bottle; `±s` shifts a torus edge.
pub fn parse_bounded(text: &str) -> Result<BoundedGrid, OptionsError> {
    let invalid = || OptionsError::Topology(text.to_string());
    let caps = BOUNDED_GRID.captures(text.trim()).ok_or_else(invalid)?;
    let width: u32 = number(&caps, 2, text, OptionsError::Topology)?;
    let height: u32 = match caps.get(5) {
        Some(_) => number(&caps, 5, text, OptionsError::Topology)?,
        None => width,
    };
    if width == 0 || height == 0 {
        return Err(invalid());
    }
    let shift = |group| -> Result<i32, OptionsError> {
        match caps.get(group) {
            Some(_) => number(&caps, group, text, OptionsError::Topology),
            None => Ok(0),
        }
    };

    let topology = match caps[1].to_ascii_uppercase().as_str() {
        "P" => Topology::Plane,
        "T" => {
            let (shift_x, shift_y) = (shift(4)?, shift(7)?);
            if shift_x != 0 && shift_y != 0 {
                return Err(invalid());
            }
            Topology::Torus { shift_x, shift_y }
        }
        "K" if caps.get(6).is_some() => Topology::Klein {
            twist: Axis::Vertical,
        },
        "K" => Topology::Klein {
            twist: Axis::Horizontal,
        },
        "C" => Topology::CrossSurface,
        _ => Topology::Sphere,
    };
    Ok(BoundedGrid::new(width, height, topology))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillMode {
    Random,
    Alternating,
    All,
    Empty,
}
impl FromStr for FillMode {
    type Err = OptionsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "random" => Ok(Self::Random),
            "alternating" => Ok(Self::Alternating),
            "all" => Ok(Self::All),
            "empty" => Ok(Self::Empty),
            _ => Err(OptionsError::FillMode(s.to_string())),
        }
    }
}
impl FillMode {
    fn fill_cell<R: rand::Rng>(&self, cell: Pos2, rng: &mut R) -> bool {
        match self {
            Self::Random => rng.random_bool(0.5),
            Self::Alternating => (cell.x + cell.y) % 2 == 0,
            Self::All => true,
            Self::Empty => false,
        }
    }

    /// Alive cells of a `w`x`h` fill in row-major order
    pub fn create_alive(self, w: i32, h: i32) -> Vec<Pos2> {
        if self == Self::Empty {
            return Vec::new();
        }
        let mut rng = rand::rng();
        (0..h)
            .flat_map(|y| (0..w).map(move |x| Pos2::new(x, y)))
            .filter(|&cell| self.fill_cell(cell, &mut rng))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(args: &[&str]) -> Args {
        Args::new(args).expect("valid args").expect("not help")
    }

    fn pos(x: i32, y: i32) -> Pos2 {
        Pos2 { x, y }
    }

    #[test]
    fn fill_mode_parses() {
        let args = args(&["--fill", "alternating"]);
        assert_eq!(args.fill_mode().ok(), Some(FillMode::Alternating));
        assert!(matches!(
            "diagonal".parse::<FillMode>(),
            Err(OptionsError::FillMode(_))
        ));
    }

    #[test]
    fn bad_numbers_are_reported() {
        let args = args(&["--gens", "many"]);
        assert!(matches!(
            args.generations(),
            Err(OptionsError::InvalidValue { name: "gens", .. })
        ));
    }

    #[test]
    fn create_alive_alternating_uses_parity() {
        let alive = FillMode::Alternating.create_alive(3, 3);

        let expected = vec![pos(0, 0), pos(2, 0), pos(1, 1), pos(0, 2), pos(2, 2)];
        assert_eq!(alive, expected);
    }

    #[test]
    fn create_alive_random_is_within_bounds() {
        let (w, h) = (4, 3);
        let alive = FillMode::Random.create_alive(w, h);

        assert!(alive.iter().all(|p| p.x >= 0 && p.y >= 0 && p.x < w && p.y < h));
        assert!(FillMode::Empty.create_alive(w, h).is_empty());
    }

    #[test]
    fn life_and_generations_rules_parse() {
        assert_eq!(parse_rule("B3/S23").ok(), Some(Rule::default()));
        assert_eq!(
            parse_rule("b2/s/3").ok(),
            Some(Rule::Generations {
                rule: MooreRule::life_like(1 << 2, 0),
                states: 3,
            })
        );
        assert_eq!(
            parse_rule("B36/S23/2").ok(),
            Some(Rule::Life(MooreRule::life_like(0b100_1000, 0b1100)))
        );
        assert!(matches!(parse_rule("B9/S23"), Err(OptionsError::Rule(_))));
    }

    #[test]
    fn ltl_rules_parse() {
        let rule = parse_rule("R5,C0,M1,S34..58,B34..45,NM").ok();
        assert_eq!(
            rule,
            Some(Rule::Ltl(LtlRule {
                range: 5,
                states: 2,
                include_middle: true,
                survival: (34, 58),
                birth: (34, 45),
                neighbourhood: Neighbourhood::Moore,
            }))
        );
        let Some(Rule::Ltl(rule)) = parse_rule("R2,C3,M0,S2..3,B3..3,NC").ok() else {
            panic!("circular rule parses");
        };
        assert_eq!(rule.neighbourhood, Neighbourhood::Circular);
        assert_eq!(rule.max_state(), 2);
        assert!(parse_rule("R0,C0,M1,S1..1,B1..1").is_err());
    }

    #[test]
    fn bounded_grids_parse() {
        let torus = parse_bounded("T30+2,20").ok();
        assert_eq!(
            torus,
            Some(BoundedGrid::new(30, 20, Topology::Torus { shift_x: 2, shift_y: 0 }))
        );
        let klein = parse_bounded("K40,30*").ok().map(|b| b.topology());
        assert_eq!(klein, Some(Topology::Klein { twist: Axis::Vertical }));
        let sphere = parse_bounded("S12").ok();
        assert_eq!(sphere.map(|b| (b.width(), b.height())), Some((12, 12)));
        assert!(parse_bounded("T30+2,20-1").is_err());
        assert!(parse_bounded("Q10").is_err());
        assert!(parse_bounded("P0,5").is_err());
    }
}
