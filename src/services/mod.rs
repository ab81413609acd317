pub mod notifier;
pub mod translator;
