use std::{sync::Arc, time::SystemTime};

use provide::*;

// Define regular traits and implementor structs

trait Logger: Send + Sync {
    fn log(&self, content: &str);
}

trait DateLogger: Send + Sync {
    fn log_date(&self);
}

#[derive(Clone)]
struct Prefix(String);

struct LoggerImpl {
    prefix: Prefix,
}

impl Logger for LoggerImpl {
    fn log(&self, content: &str) {
        println!("{} {}", self.prefix.0, content);
    }
}

// Constructed automatically: the logger is injected, the clock is read at initialization
#[derive(Clone, Default)]
struct DateLoggerImpl {
    logger: Option<Arc<dyn Logger>>,
    started: u64,
}

impl AutoProvide for DateLoggerImpl {
    fn plan(plan: &mut Plan<Self>) -> Result<(), ProvideError> {
        plan.field(
            "logger",
            Injection::Eager,
            |d: &mut Self, logger: Arc<dyn Logger>| d.logger = Some(logger),
        )?
        .initialize();
        Ok(())
    }
}

impl Initialize for DateLoggerImpl {
    type Deps = ();

    fn initialize(&mut self, _deps: ()) -> Result<(), BoxError> {
        self.started = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)?
            .as_secs();
        Ok(())
    }
}

impl DateLogger for DateLoggerImpl {
    fn log_date(&self) {
        if let Some(logger) = &self.logger {
            logger.log(&format!("{}s since epoch", self.started));
        }
    }
}

impl_value!(Prefix);
impl_value!(auto DateLoggerImpl);

// Rules selecting the implementation of each trait

fn logger(prefix: Prefix) -> Arc<dyn Logger> {
    Arc::new(LoggerImpl { prefix })
}

fn date_logger(date_logger: DateLoggerImpl) -> Arc<dyn DateLogger> {
    Arc::new(date_logger)
}

fn main() -> Result<(), ProvideError> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut provider = Provider::new();
    provider
        .add_rule(|| Prefix("[demo]".to_string()))?
        .add_rule(logger)?
        .add_rule(date_logger)?;

    let injector = Injector::from(provider);
    let b: Arc<dyn DateLogger> = injector.inject()?;

    b.log_date();

    Ok(())
}
