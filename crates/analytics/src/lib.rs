pub mod allocation;
pub mod insights;
pub mod spending;

pub use allocation::{allocate, AllocationSummary, BucketLine};
pub use insights::{budget_recommendations, generate_insights, BudgetRecommendation, Insight, InsightKind};
pub use spending::{
    category_breakdown, category_trends, detect_recurring, monthly_trends, spending_by_account,
    spending_by_recurrence, spending_statistics, spending_velocity, top_merchants, AccountSpend,
    CategorySpend, CategoryTrend, CategoryTrends, MerchantSpend, MonthTrend, RecurringCharge,
    SpendingStats, SpendingVelocity, DEFAULT_MIN_OCCURRENCES,
};
