//! Analysis payload fixture.
//!
//! DESIGN
//! ======
//! Every completed response cycle attaches the same precomputed dataset:
//! a six-month revenue/orders series, a three-way channel breakdown, four
//! summary metric cards, and a few insight notes. These are compile-time
//! constants, not computations — the presentation surface renders them
//! whenever an assistant entry carries `has_analysis = true`.

use serde::Serialize;

// =============================================================================
// TYPES
// =============================================================================

/// One point of the monthly sales series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MonthlyPoint {
    pub month: &'static str,
    pub revenue: u32,
    pub orders: u32,
}

/// One slice of the traffic channel breakdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChannelSlice {
    pub name: &'static str,
    pub value: u32,
}

/// Direction indicator on a summary metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
}

/// One summary metric card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MetricCard {
    pub title: &'static str,
    pub value: &'static str,
    pub change: &'static str,
    pub trend: Trend,
}

/// One narrative insight note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct InsightNote {
    pub title: &'static str,
    pub body: &'static str,
}

/// The full fixture attached to a completed assistant response.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct AnalysisPayload {
    pub sales: &'static [MonthlyPoint],
    pub channels: &'static [ChannelSlice],
    pub metrics: &'static [MetricCard],
    pub highlights: &'static [InsightNote],
}

// =============================================================================
// FIXTURE DATA
// =============================================================================

pub const SALES_SERIES: [MonthlyPoint; 6] = [
    MonthlyPoint { month: "Jan", revenue: 4000, orders: 240 },
    MonthlyPoint { month: "Feb", revenue: 3000, orders: 139 },
    MonthlyPoint { month: "Mar", revenue: 5000, orders: 980 },
    MonthlyPoint { month: "Apr", revenue: 2780, orders: 390 },
    MonthlyPoint { month: "May", revenue: 1890, orders: 480 },
    MonthlyPoint { month: "Jun", revenue: 6390, orders: 380 },
];

pub const CHANNEL_BREAKDOWN: [ChannelSlice; 3] = [
    ChannelSlice { name: "Desktop", value: 400 },
    ChannelSlice { name: "Mobile", value: 300 },
    ChannelSlice { name: "Tablet", value: 100 },
];

pub const SUMMARY_METRICS: [MetricCard; 4] = [
    MetricCard { title: "Total Revenue", value: "$23,456", change: "+12.5%", trend: Trend::Up },
    MetricCard { title: "Active Users", value: "2,384", change: "+8.2%", trend: Trend::Up },
    MetricCard { title: "Orders", value: "1,247", change: "-2.4%", trend: Trend::Down },
    MetricCard { title: "Conversion Rate", value: "3.24%", change: "+0.8%", trend: Trend::Up },
];

pub const HIGHLIGHTS: [InsightNote; 3] = [
    InsightNote {
        title: "Revenue Growth",
        body: "Your revenue has increased by 12.5% this month, driven primarily by mobile traffic increases.",
    },
    InsightNote {
        title: "Opportunity",
        body: "Desktop conversion rates are 2.3x higher than mobile. Consider optimizing mobile UX.",
    },
    InsightNote {
        title: "Prediction",
        body: "Based on current trends, you're on track to exceed quarterly targets by 8%.",
    },
];

/// Canned queries offered by the input surface. Opaque text to the
/// controller — selecting one submits it like any free-text query.
pub const SUGGESTED_QUERIES: [&str; 4] = [
    "Show me last quarter's sales performance",
    "What are the top performing products?",
    "Analyze customer acquisition trends",
    "Compare revenue by region",
];

/// The payload served to the presentation surface.
#[must_use]
pub fn analysis_payload() -> AnalysisPayload {
    AnalysisPayload {
        sales: &SALES_SERIES,
        channels: &CHANNEL_BREAKDOWN,
        metrics: &SUMMARY_METRICS,
        highlights: &HIGHLIGHTS,
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[path = "insights_test.rs"]
mod tests;
