use shared::metrics_defs::{MetricDef, MetricType};

pub const FEEDBACK_SUBMISSIONS: MetricDef = MetricDef {
    name: "feedback.submissions",
    metric_type: MetricType::Counter,
    description: "Number of handled submissions. Tagged with outcome.",
};

pub const AI_FALLBACK: MetricDef = MetricDef {
    name: "feedback.ai_fallback",
    metric_type: MetricType::Counter,
    description: "Number of submissions that used the fallback assessment. Tagged with reason.",
};

pub const REQUEST_DURATION: MetricDef = MetricDef {
    name: "feedback.request.duration",
    metric_type: MetricType::Histogram,
    description: "Request duration in seconds. Tagged with status, route.",
};

pub const FORWARD_DURATION: MetricDef = MetricDef {
    name: "feedback.forward.duration",
    metric_type: MetricType::Histogram,
    description: "Time spent forwarding to the storage endpoint in seconds",
};

pub const ALL_METRICS: &[MetricDef] = &[
    FEEDBACK_SUBMISSIONS,
    AI_FALLBACK,
    REQUEST_DURATION,
    FORWARD_DURATION,
];
