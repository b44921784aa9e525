use metriken::{Counter, LazyCounter, metric};

#[derive(Debug, Clone, Copy)]
pub enum RequestStatus {
    Success,
    Failed(ErrorType),
}

#[derive(Debug, Clone, Copy)]
pub enum ErrorType {
    Connection,
    Timeout,
    Http,
    Parse,
    Other,
}

// Request metrics
#[metric(
    name = "requests",
    description = "Total number of generation requests",
    metadata = { status = "sent" }
)]
pub static REQUESTS_SENT: LazyCounter = LazyCounter::new(Counter::default);

#[metric(
    name = "requests",
    description = "Successful generation requests",
    metadata = { status = "success" }
)]
pub static REQUESTS_SUCCESS: LazyCounter = LazyCounter::new(Counter::default);

#[metric(
    name = "requests",
    description = "Failed generation requests",
    metadata = { status = "failed" }
)]
pub static REQUESTS_FAILED: LazyCounter = LazyCounter::new(Counter::default);

// Error category metrics
#[metric(
    name = "errors",
    description = "Connection errors",
    metadata = { "type" = "connection" }
)]
pub static ERRORS_CONNECTION: LazyCounter = LazyCounter::new(Counter::default);

#[metric(
    name = "errors",
    description = "Request timeouts",
    metadata = { "type" = "timeout" }
)]
pub static ERRORS_TIMEOUT: LazyCounter = LazyCounter::new(Counter::default);

#[metric(
    name = "errors",
    description = "Non-OK HTTP status",
    metadata = { "type" = "http" }
)]
pub static ERRORS_HTTP: LazyCounter = LazyCounter::new(Counter::default);

#[metric(
    name = "errors",
    description = "Malformed response payloads",
    metadata = { "type" = "parse" }
)]
pub static ERRORS_PARSE: LazyCounter = LazyCounter::new(Counter::default);

#[metric(
    name = "errors",
    description = "Other errors",
    metadata = { "type" = "other" }
)]
pub static ERRORS_OTHER: LazyCounter = LazyCounter::new(Counter::default);

// Token metrics
#[metric(
    name = "tokens",
    description = "Output tokens reported by the server",
    metadata = { direction = "output" }
)]
pub static TOKENS_OUTPUT: LazyCounter = LazyCounter::new(Counter::default);

#[metric(
    name = "models_skipped",
    description = "Configured models without a descriptor"
)]
pub static MODELS_SKIPPED: LazyCounter = LazyCounter::new(Counter::default);

pub struct Metrics;

impl Metrics {
    pub fn record_request_sent() {
        REQUESTS_SENT.increment();
    }

    pub fn record_request_complete(status: RequestStatus) {
        match status {
            RequestStatus::Success => {
                REQUESTS_SUCCESS.increment();
            }
            RequestStatus::Failed(error_type) => {
                REQUESTS_FAILED.increment();
                match error_type {
                    ErrorType::Connection => ERRORS_CONNECTION.increment(),
                    ErrorType::Timeout => ERRORS_TIMEOUT.increment(),
                    ErrorType::Http => ERRORS_HTTP.increment(),
                    ErrorType::Parse => ERRORS_PARSE.increment(),
                    ErrorType::Other => ERRORS_OTHER.increment(),
                };
            }
        }
    }

    pub fn record_output_tokens(count: u64) {
        TOKENS_OUTPUT.add(count);
    }

    pub fn record_model_skipped() {
        MODELS_SKIPPED.increment();
    }

    /// One-line snapshot of every counter, for the end-of-run summary.
    pub fn summary() -> String {
        format!(
            "Requests: Sent: {} Ok: {} Err: {} (connection: {} timeout: {} http: {} parse: {} other: {}) Output tokens: {} Models skipped: {}",
            REQUESTS_SENT.value(),
            REQUESTS_SUCCESS.value(),
            REQUESTS_FAILED.value(),
            ERRORS_CONNECTION.value(),
            ERRORS_TIMEOUT.value(),
            ERRORS_HTTP.value(),
            ERRORS_PARSE.value(),
            ERRORS_OTHER.value(),
            TOKENS_OUTPUT.value(),
            MODELS_SKIPPED.value()
        )
    }
}
