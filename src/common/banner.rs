const GREEN: &str = "\x1b[32m";
const CYAN: &str = "\x1b[36m";
const YELLOW: &str = "\x1b[33m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";
const DIM: &str = "\x1b[2m";

macro_rules! env_or {
    ($key:literal, $default:literal) => {
        option_env!($key).unwrap_or($default)
    };
}

pub struct BannerInfo {
    pub version: &'static str,
    /// Unix milliseconds, as emitted by the build script.
    pub build_time: &'static str,
    pub commit: &'static str,
    pub profile: &'static str,
    pub listen: String,
    pub strategies: Vec<String>,
}

impl BannerInfo {
    pub fn new(listen: String, strategies: Vec<String>) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION"),
            build_time: env_or!("BUILD_TIME", "unknown"),
            commit: env_or!("GIT_COMMIT", "unknown"),
            profile: if cfg!(debug_assertions) {
                "debug"
            } else {
                "release"
            },
            listen,
            strategies,
        }
    }
}

pub fn print_banner(info: &BannerInfo) {
    println!();
    println!("{GREEN}  _                                 _              {RESET}");
    println!("{GREEN} | |_ _   _ _ __   ___ _ __ ___| | __ _ _   _    {RESET}");
    println!("{GREEN} | __| | | | '_ \\ / _ \\ '__/ _ \\ |/ _` | | | |   {RESET}");
    println!("{GREEN} | |_| |_| | | | |  __/ | |  __/ | (_| | |_| |   {RESET}");
    println!("{GREEN}  \\__|\\__,_|_| |_|\\___|_|  \\___|_|\\__,_|\\__, |   {RESET}");
    println!("{GREEN}                                        |___/    {RESET}");
    println!("{DIM}========================================{RESET}");
    println!();

    print_row("Version", info.version, CYAN);
    print_row("Build time", info.build_time, RESET);
    print_row("Commit", info.commit, RESET);
    print_row("Profile", info.profile, YELLOW);
    print_row_owned("Listening", &info.listen);
    print_row_owned("Strategies", &info.strategies.join(" > "));
    println!();
}

fn print_row(label: &str, value: &'static str, color: &str) {
    println!("  {BOLD}{label:<14}{RESET}{color}{value}{RESET}");
}

fn print_row_owned(label: &str, value: &str) {
    println!("  {BOLD}{label:<14}{RESET}{value}");
}
