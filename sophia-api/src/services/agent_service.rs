// The business agent: builds prompts, runs them through the LLM client, and
// shapes structured responses. Shaping is deterministic over the business
// record; the completion text is advisory only while the client is stubbed.

use serde::Serialize;

use sophia_shared::clients::llm::LlmClient;

use crate::models::Business;

// ─── Market analysis ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct PriceRange {
    pub low: f64,
    pub high: f64,
    pub currency: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct MarketAnalysis {
    pub industry: String,
    pub summary: String,
    pub competition_level: String,
    pub opportunities: Vec<String>,
    pub risks: Vec<String>,
    pub suggested_price_range: PriceRange,
}

/// Industries where a small SaaS faces an entrenched field.
const CROWDED_INDUSTRIES: &[&str] = &[
    "productivity", "marketing", "e-commerce", "fitness", "finance", "education",
];

pub fn build_market_analysis_prompt(business: &Business) -> String {
    format!(
        "Analyze the market for a {industry} subscription product named \
         \"{name}\" priced at {price} {currency}/month. {description} \
         List the main opportunities, risks, and the competitive landscape.",
        industry = business.industry,
        name = business.name,
        price = business.monthly_price,
        currency = business.currency,
        description = business.description.as_deref().unwrap_or(""),
    )
}

pub fn shape_market_analysis(business: &Business) -> MarketAnalysis {
    let industry_lower = business.industry.to_lowercase();
    let crowded = CROWDED_INDUSTRIES
        .iter()
        .any(|i| industry_lower.contains(i));

    let competition_level = if crowded { "high" } else { "moderate" };

    let (low, high) = if business.monthly_price > 0.0 {
        (business.monthly_price * 0.8, business.monthly_price * 1.5)
    } else {
        (9.0, 49.0)
    };

    MarketAnalysis {
        industry: business.industry.clone(),
        summary: format!(
            "{} targets the {} space, where competition is {}. Differentiation \
             through a narrow niche and fast iteration matters more than feature breadth.",
            business.name, business.industry, competition_level
        ),
        competition_level: competition_level.to_string(),
        opportunities: vec![
            format!("Underserved niches inside {} with specific workflows", business.industry),
            "Content-driven acquisition is cheap at this stage".to_string(),
            "Annual plans improve cash flow once churn stabilizes".to_string(),
        ],
        risks: vec![
            if crowded {
                format!("Established {} incumbents compress pricing", business.industry)
            } else {
                "Small market may cap growth without expansion".to_string()
            },
            "Single-founder execution risk".to_string(),
            "Acquisition costs rise as channels saturate".to_string(),
        ],
        suggested_price_range: PriceRange {
            low: (low * 100.0).round() / 100.0,
            high: (high * 100.0).round() / 100.0,
            currency: business.currency.clone(),
        },
    }
}

pub async fn market_analysis(llm: &LlmClient, business: &Business) -> MarketAnalysis {
    let prompt = build_market_analysis_prompt(business);
    if let Err(e) = llm.complete(&prompt).await {
        tracing::warn!(error = %e, "llm completion failed, using shaped analysis");
    }
    shape_market_analysis(business)
}

// ─── Business plan ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct PlanPhase {
    pub name: String,
    pub duration_weeks: u32,
    pub milestones: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BusinessPlan {
    pub business_name: String,
    pub summary: String,
    pub phases: Vec<PlanPhase>,
}

pub fn build_business_plan_prompt(business: &Business) -> String {
    format!(
        "Write a phased launch plan for \"{name}\", a {industry} product \
         currently in status {status}. Include validation, build, launch, \
         and growth phases with concrete milestones.",
        name = business.name,
        industry = business.industry,
        status = business.status,
    )
}

pub fn shape_business_plan(business: &Business) -> BusinessPlan {
    BusinessPlan {
        business_name: business.name.clone(),
        summary: format!(
            "A four-phase plan taking {} from idea validation to repeatable growth.",
            business.name
        ),
        phases: vec![
            PlanPhase {
                name: "Validate".to_string(),
                duration_weeks: 2,
                milestones: vec![
                    format!("Interview 10 potential {} customers", business.industry),
                    "Publish a landing page with a waitlist".to_string(),
                    "Collect 50 waitlist signups".to_string(),
                ],
            },
            PlanPhase {
                name: "Build".to_string(),
                duration_weeks: 6,
                milestones: vec![
                    "Ship the smallest billable feature set".to_string(),
                    "Wire up subscription checkout".to_string(),
                    "Instrument analytics on the core funnel".to_string(),
                ],
            },
            PlanPhase {
                name: "Launch".to_string(),
                duration_weeks: 2,
                milestones: vec![
                    "Onboard waitlist users personally".to_string(),
                    format!(
                        "Announce in 3 {} communities",
                        business.industry.to_lowercase()
                    ),
                    "Reach 10 paying customers".to_string(),
                ],
            },
            PlanPhase {
                name: "Grow".to_string(),
                duration_weeks: 12,
                milestones: vec![
                    "Establish one repeatable acquisition channel".to_string(),
                    "Cut monthly churn below 5%".to_string(),
                    format!(
                        "Reach {} {}/month recurring revenue",
                        (business.monthly_price.max(10.0) * 100.0).round(),
                        business.currency
                    ),
                ],
            },
        ],
    }
}

pub async fn business_plan(llm: &LlmClient, business: &Business) -> BusinessPlan {
    let prompt = build_business_plan_prompt(business);
    if let Err(e) = llm.complete(&prompt).await {
        tracing::warn!(error = %e, "llm completion failed, using shaped plan");
    }
    shape_business_plan(business)
}

// ─── Recommendations ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct Recommendation {
    pub priority: u32,
    pub title: String,
    pub rationale: String,
    pub impact: String,
    pub effort: String,
}

pub fn build_recommendations_prompt(business: &Business) -> String {
    format!(
        "Recommend the next actions for \"{name}\" ({industry}, status \
         {status}). Consider website presence, analytics coverage, and pricing.",
        name = business.name,
        industry = business.industry,
        status = business.status,
    )
}

/// Gap-driven recommendations: missing fundamentals outrank optimizations.
pub fn shape_recommendations(business: &Business) -> Vec<Recommendation> {
    let mut recs = Vec::new();

    if business.website_url.is_none() {
        recs.push(Recommendation {
            priority: 0,
            title: "Ship a public website".to_string(),
            rationale: "Without a site there is nothing to market, measure, or monitor.".to_string(),
            impact: "high".to_string(),
            effort: "low".to_string(),
        });
    }

    if business.tracking_config().is_none() {
        recs.push(Recommendation {
            priority: 0,
            title: "Set up analytics tracking".to_string(),
            rationale: "Every later decision needs baseline traffic and conversion data.".to_string(),
            impact: "high".to_string(),
            effort: "low".to_string(),
        });
    }

    if business.monthly_price <= 0.0 {
        recs.push(Recommendation {
            priority: 0,
            title: "Put a price on the product".to_string(),
            rationale: "Free-only products never validate willingness to pay.".to_string(),
            impact: "high".to_string(),
            effort: "medium".to_string(),
        });
    }

    recs.push(Recommendation {
        priority: 0,
        title: "Publish two pieces of niche content per week".to_string(),
        rationale: format!(
            "Organic reach in {} compounds and costs nothing but time.",
            business.industry
        ),
        impact: "medium".to_string(),
        effort: "medium".to_string(),
    });

    recs.push(Recommendation {
        priority: 0,
        title: "Audit the signup-to-paid funnel".to_string(),
        rationale: "Small conversion wins beat new traffic at this scale.".to_string(),
        impact: "medium".to_string(),
        effort: "low".to_string(),
    });

    for (i, rec) in recs.iter_mut().enumerate() {
        rec.priority = i as u32 + 1;
    }
    recs
}

pub async fn recommendations(llm: &LlmClient, business: &Business) -> Vec<Recommendation> {
    let prompt = build_recommendations_prompt(business);
    if let Err(e) = llm.complete(&prompt).await {
        tracing::warn!(error = %e, "llm completion failed, using shaped recommendations");
    }
    shape_recommendations(business)
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn business() -> Business {
        Business {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            name: "Trail Planner".to_string(),
            description: Some("Route planning for hikers".to_string()),
            industry: "Fitness".to_string(),
            monthly_price: 12.0,
            currency: "EUR".to_string(),
            status: "PLANNING".to_string(),
            website_url: None,
            repo_url: None,
            landing_url: None,
            analytics_property_id: None,
            analytics_measurement_id: None,
            analytics_stream_id: None,
            stripe_product_id: None,
            stripe_price_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn crowded_industry_reads_as_high_competition() {
        let analysis = shape_market_analysis(&business());
        assert_eq!(analysis.competition_level, "high");
        assert_eq!(analysis.suggested_price_range.low, 9.6);
        assert_eq!(analysis.suggested_price_range.high, 18.0);
    }

    #[test]
    fn unpriced_product_gets_default_range() {
        let mut b = business();
        b.monthly_price = 0.0;
        let analysis = shape_market_analysis(&b);
        assert_eq!(analysis.suggested_price_range.low, 9.0);
        assert_eq!(analysis.suggested_price_range.high, 49.0);
    }

    #[test]
    fn plan_has_four_phases_with_milestones() {
        let plan = shape_business_plan(&business());
        assert_eq!(plan.phases.len(), 4);
        assert!(plan.phases.iter().all(|p| !p.milestones.is_empty()));
        assert_eq!(plan.phases[0].name, "Validate");
    }

    #[test]
    fn missing_fundamentals_lead_recommendations() {
        let recs = shape_recommendations(&business());
        assert_eq!(recs[0].title, "Ship a public website");
        assert_eq!(recs[1].title, "Set up analytics tracking");
        assert_eq!(recs[0].priority, 1);
    }

    #[test]
    fn complete_business_gets_only_optimizations() {
        let mut b = business();
        b.website_url = Some("https://trail.example".to_string());
        b.analytics_property_id = Some("p1".to_string());
        b.analytics_measurement_id = Some("m1".to_string());
        b.analytics_stream_id = Some("s1".to_string());

        let recs = shape_recommendations(&b);
        assert_eq!(recs.len(), 2);
        assert!(recs.iter().all(|r| r.impact == "medium"));
    }
}
