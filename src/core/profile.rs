//! Student/parent persona and age bracket selection.

use std::fmt;
use std::str::FromStr;

const MODE_PREFIX: &str = "I am a ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    Student,
    Parent,
}

impl Mode {
    pub const ALL: [Mode; 2] = [Mode::Student, Mode::Parent];

    pub fn label(&self) -> &'static str {
        match self {
            Mode::Student => "I am a student",
            Mode::Parent => "I am a parent",
        }
    }

    /// Key used to look up the persona's prompt template.
    pub fn persona(&self) -> &'static str {
        match self {
            Mode::Student => "student",
            Mode::Parent => "parent",
        }
    }

    pub fn help_message(&self) -> String {
        let example = match self {
            Mode::Student => "For example: Can you help me understand the difference between a planet and a dwarf planet?",
            Mode::Parent => "For example: How can I help my child learn planets in the solar system?",
        };
        format!(
            "Questions and answers will appear here. Please type your questions below. {}",
            example
        )
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim();
        let key = key.strip_prefix(MODE_PREFIX).unwrap_or(key);
        Mode::ALL
            .into_iter()
            .find(|mode| mode.persona().eq_ignore_ascii_case(key))
            .ok_or_else(|| format!("unknown mode '{}', expected 'student' or 'parent'", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AgeBracket {
    FiveToTen,
    ElevenToThirteen,
    FourteenToEighteen,
    NineteenPlus,
}

impl AgeBracket {
    pub const ALL: [AgeBracket; 4] = [
        AgeBracket::FiveToTen,
        AgeBracket::ElevenToThirteen,
        AgeBracket::FourteenToEighteen,
        AgeBracket::NineteenPlus,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            AgeBracket::FiveToTen => "5-10 years",
            AgeBracket::ElevenToThirteen => "11-13 years",
            AgeBracket::FourteenToEighteen => "14-18 years",
            AgeBracket::NineteenPlus => "19+ years",
        }
    }
}

impl fmt::Display for AgeBracket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for AgeBracket {
    type Err = String;

    /// Accepts the full label, the label without " years", or a 1-based index.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim();
        if let Ok(index) = key.parse::<usize>() {
            if (1..=AgeBracket::ALL.len()).contains(&index) {
                return Ok(AgeBracket::ALL[index - 1]);
            }
        }
        AgeBracket::ALL
            .into_iter()
            .find(|age| age.label() == key || age.label().trim_end_matches(" years") == key)
            .ok_or_else(|| {
                format!(
                    "unknown age '{}', expected one of: 5-10, 11-13, 14-18, 19+",
                    s
                )
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Profile {
    pub mode: Mode,
    pub age: AgeBracket,
}

impl Profile {
    pub fn new(mode: Mode, age: AgeBracket) -> Self {
        Self { mode, age }
    }

    /// Resolve the `{age}` placeholder of a persona template.
    pub fn system_prompt(&self, template: &str) -> String {
        template.replace("{age}", self.age.label())
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.mode, self.age)
    }
}
