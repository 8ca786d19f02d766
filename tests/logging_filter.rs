// tests/logging_filter.rs

use tracing_subscriber::filter::LevelFilter;

use effects_controller::cli::LogLevel;
use effects_controller::logging::build_filter;

#[test]
fn cli_level_beats_environment() {
    let (filter, rejected) = build_filter(Some(LogLevel::Warn), Some("trace"));
    assert_eq!(filter.max_level_hint(), Some(LevelFilter::WARN));
    assert!(rejected.is_none());
}

#[test]
fn environment_directives_apply_without_cli_level() {
    let (filter, rejected) = build_filter(None, Some("effects_controller::engine=trace,warn"));
    assert_eq!(filter.max_level_hint(), Some(LevelFilter::TRACE));
    assert!(rejected.is_none());
}

#[test]
fn missing_or_blank_environment_means_info() {
    for env in [None, Some(""), Some("   ")] {
        let (filter, rejected) = build_filter(None, env);
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::INFO));
        assert!(rejected.is_none());
    }
}

#[test]
fn unparsable_environment_falls_back_and_is_reported() {
    let (filter, rejected) = build_filter(None, Some("effects_controller=loud"));
    assert_eq!(filter.max_level_hint(), Some(LevelFilter::INFO));
    assert_eq!(rejected.as_deref(), Some("effects_controller=loud"));
}
