use std::fmt::Debug;
use std::process::ExitCode;
use std::sync::atomic::{AtomicI32, Ordering};

pub trait CliArgs: clap::Parser + Debug { }
impl<T: clap::Parser + Debug> CliArgs for T { }

// workspace crates that get the verbose default log level
const WORKSPACE_CRATES: [&str; 4] = ["flatbvh", "nab_flatbvh", "math_flatbvh", "containers_flatbvh"];

fn crate_name<T>() -> &'static str
{
    let name = std::any::type_name::<T>();
    match name.find("::")
    {
        Some(i) => &name[0..i],
        None => name,
    }
}

fn join_args<I>(separator: &str, iter: I) -> String
where I: Iterator,
      I::Item: std::fmt::Display
{
    let mut out = String::new();
    for (i, item) in iter.enumerate()
    {
        if i > 0 { out.push_str(separator); }
        out.push_str(&item.to_string());
    }
    out
}

#[derive(Debug)]
pub struct AppRun<TCliArgs: CliArgs>
{
    pub app_name: &'static str,
    pub version_str: &'static str,

    pub start_time: chrono::DateTime<chrono::Local>,
    pub args: TCliArgs,
    pub pid: u32,

    exit_reason: AtomicI32,
}
impl<TCliArgs: CliArgs> AppRun<TCliArgs>
{
    pub fn startup(app_name: &'static str, app_version: &'static str) -> Self
    {
        #[cfg(debug_assertions)]
        let default_log_levels = (log::LevelFilter::Warn, log::LevelFilter::Debug);
        #[cfg(not(debug_assertions))]
        let default_log_levels = (log::LevelFilter::Warn, log::LevelFilter::Info);

        let app_crate = crate_name::<TCliArgs>();
        let mut builder = colog::basic_builder();
        builder
            .filter_level(default_log_levels.0)
            .filter_module(app_crate, default_log_levels.1);
        for module in WORKSPACE_CRATES
        {
            builder.filter_module(module, default_log_levels.1);
        }
        builder.parse_default_env().init();

        let app_run = Self
        {
            app_name,
            version_str: app_version,
            start_time: chrono::Local::now(),
            args: TCliArgs::parse(),
            pid: std::process::id(),
            exit_reason: AtomicI32::new(ExitReason::NormalExit as i32),
        };

        log::info!(target: app_crate,
            "=== Starting {} v{} [{}] (PID {}) at {} ===",
            app_run.app_name,
            app_run.version_str,
            join_args(" ", std::env::args()),
            app_run.pid,
            app_run.start_time);

        app_run
    }

    pub fn set_exit_reason(&self, exit_reason: ExitReason)
    {
        self.exit_reason.store(exit_reason as i32, Ordering::SeqCst);
    }
    pub fn get_exit_reason(&self) -> ExitReason
    {
        ExitReason::from_code(self.exit_reason.load(Ordering::SeqCst))
    }
}
impl<TCliArgs: CliArgs> Drop for AppRun<TCliArgs>
{
    fn drop(&mut self)
    {
        log::info!(target: "app",
            "Exiting {} (PID {}) at {} with reason {:?}",
            self.app_name,
            self.pid,
            chrono::Local::now(),
            self.get_exit_reason());
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitReason
{
    NormalExit = 0,
    BadConfig = 2,
    ValidationFailed = 3,
    Panic = 99,
}
impl ExitReason
{
    #[must_use]
    pub fn from_code(code: i32) -> Self
    {
        match code
        {
            0 => Self::NormalExit,
            2 => Self::BadConfig,
            3 => Self::ValidationFailed,
            _ => Self::Panic,
        }
    }
}
impl std::process::Termination for ExitReason
{
    fn report(self) -> ExitCode
    {
        (self as u8).into()
    }
}
