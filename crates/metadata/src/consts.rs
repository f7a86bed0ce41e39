use regex::Regex;
use std::sync::LazyLock;

macro_rules! regex {
    ($name:ident, $regex:expr) => {
        pub(crate) static $name: LazyLock<Regex> = LazyLock::new(|| Regex::new($regex).unwrap());
    };
}

// Chapter names, e.g. "Vol.01 Ch.012.5v2: Title Read Online".
regex!(VOLUME_REGEX, r"(?i)\bvol(?:ume|\.)?\s*(\d+)");
regex!(CHAPTER_REGEX, r"(?i)\bch(?:apter|\.)?\s*(\d+(?:\.\d+)?)(?:\s*v(\d+))?");
regex!(BARE_NUMBER_REGEX, r"^(\d+(?:\.\d+)?)(?:v(\d+))?\b");
regex!(TITLE_REGEX, r"(?::|\s-)\s*(.+)$");
regex!(READ_ONLINE_REGEX, r"(?i)\s*read\s+online\s*$");

// Upload dates.
regex!(ARCHIVED_REGEX, r"(?i)^(.*)\s+\[A\]$");
regex!(RELATIVE_REGEX, r"(?i)^(a|an|\d+)\s+(minute|hour|day|week)s?\s+ago$");
regex!(PM_REGEX, r"(?i)\sPM$");
regex!(NOON_REGEX, r"(?i)(?:^|\s)12:\d\d\s*PM$");
regex!(MERIDIEM_REGEX, r"(?i)\s*[AP]M$");
regex!(DASHED_TIME_REGEX, r"^(.*?)\s+-\s+(\d{1,2}:\d\d)$");

// Filesystem names.
regex!(SERIES_ILLEGAL_REGEX, r#"["<>|:*?\\/]"#);
regex!(NAME_ILLEGAL_REGEX, r#"[:\\/*?|<>"\p{Cc}]"#);
regex!(TRAILING_DOTS_REGEX, r"[. ]*$");
