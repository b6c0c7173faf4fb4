//! Bundled sample analysis.

use serde_json::json;

use reportforge_shared::AnalysisInput;

/// Analysis input for a fictional analytics vendor covering every built-in section.
///
/// Backs `reportforge generate --sample` and the end-to-end tests.
pub fn sample_input() -> AnalysisInput {
    json!({
        "subject": "Acme Analytics",
        "executive_summary": {
            "headline": "Acme is positioned for selective expansion",
            "pillars": [
                {"label": "Market", "value": 32},
                {"label": "Product", "value": 28},
                {"label": "Operations", "value": 22},
                {"label": "Finance", "value": 18}
            ]
        },
        "market_overview": {
            "segments": [
                {"label": "Enterprise", "value": 420},
                {"label": "Mid-market", "value": 260},
                {"label": "SMB", "value": 180},
                {"label": "Public sector", "value": 90},
                {"label": "Education", "value": 50}
            ],
            "unit": "USD m"
        },
        "growth_trajectory": {
            "periods": [
                {"label": "2021", "value": 100},
                {"label": "2022", "value": 118},
                {"label": "2023", "value": 131},
                {"label": "2024", "value": 155}
            ]
        },
        "competitive_landscape": {
            "axes": ["Price", "Features", "Support", "Brand", "Reach"],
            "competitors": [
                {"name": "Acme", "values": [7, 8, 6, 5, 6]},
                {"name": "Globex", "values": [5, 7, 8, 8, 7]},
                {"name": "Initech", "values": [8, 5, 5, 4, 5]}
            ]
        },
        "market_share": {
            "shares": [
                {"label": "Globex", "value": 34},
                {"label": "Acme", "value": 27},
                {"label": "Initech", "value": 21},
                {"label": "Others", "value": 18}
            ]
        },
        "swot_analysis": {
            "factors": [
                {"label": "Strengths", "value": 8},
                {"label": "Weaknesses", "value": 5},
                {"label": "Opportunities", "value": 7},
                {"label": "Threats", "value": 6}
            ]
        },
        "risk_matrix": {
            "risks": [
                {"label": "Key supplier failure", "x": 0.4, "y": 0.9},
                {"label": "Pricing pressure", "x": 0.8, "y": 0.75},
                {"label": "Talent attrition", "x": 0.5, "y": 0.5},
                {"label": "Data breach", "x": 0.2, "y": 0.95}
            ]
        },
        "customer_segments": {
            "segments": [
                {"label": "Retail", "value": 45},
                {"label": "Healthcare", "value": 25},
                {"label": "Logistics", "value": 20},
                {"label": "Energy", "value": 6},
                {"label": "Other", "value": 4}
            ]
        },
        "revenue_breakdown": {
            "streams": [
                {"label": "Subscriptions", "value": 62},
                {"label": "Services", "value": 23},
                {"label": "Licensing", "value": 15}
            ]
        },
        "pricing_analysis": {
            "price_points": [
                {"label": "Globex", "value": 129},
                {"label": "Initech", "value": 89},
                {"label": "Umbrella", "value": 110},
                {"label": "Hooli", "value": 99}
            ],
            "own_price": 105
        },
        "technology_adoption": {
            "periods": ["2022", "2023", "2024"],
            "technologies": [
                {"name": "Cloud data platforms", "values": [35, 48, 61]},
                {"name": "Generative AI", "values": [5, 22, 47]},
                {"name": "Edge analytics", "values": [12, 15, 19]}
            ]
        },
        "regulatory_environment": {
            "pressures": [
                {"label": "Data privacy", "value": 8.5},
                {"label": "AI governance", "value": 7.2},
                {"label": "Export controls", "value": 3.1},
                {"label": "Competition law", "value": 4.4}
            ]
        },
        "supply_chain": {
            "suppliers": [
                {"label": "ChipCo", "value": 46},
                {"label": "CloudHost", "value": 30},
                {"label": "NetServe", "value": 14},
                {"label": "Others", "value": 10}
            ]
        },
        "investment_flows": {
            "quarters": [
                {"label": "Q1", "value": 12},
                {"label": "Q2", "value": -4},
                {"label": "Q3", "value": 18},
                {"label": "Q4", "value": 25}
            ]
        },
        "talent_landscape": {
            "skills": ["Data engineering", "ML research", "Product design", "Sales engineering"],
            "teams": [
                {"name": "Platform", "values": [8, 5, 4, 3]},
                {"name": "Applied AI", "values": [6, 8, 3, 2]},
                {"name": "Go-to-market", "values": [3, 2, 6, 7]}
            ]
        },
        "geographic_distribution": {
            "regions": [
                {"label": "North America", "value": 48},
                {"label": "Europe", "value": 27},
                {"label": "APAC", "value": 17},
                {"label": "LATAM", "value": 8}
            ]
        },
        "partnership_network": {
            "partners": [
                {"label": "SysIntegrator A", "x": 0.8, "y": 0.7, "size": 40},
                {"label": "Cloud Alliance", "x": 0.9, "y": 0.9, "size": 65},
                {"label": "Regional Reseller", "x": 0.4, "y": 0.5, "size": 12}
            ]
        },
        "scenario_planning": {
            "periods": ["2025", "2026", "2027"],
            "scenarios": [
                {"name": "Base", "values": [160, 178, 195]},
                {"name": "Upside", "values": [165, 195, 232]},
                {"name": "Downside", "values": [150, 152, 149]}
            ]
        },
        "innovation_pipeline": {
            "initiatives": [
                {"label": "Self-serve onboarding", "x": 0.8, "y": 0.7},
                {"label": "Vertical AI copilots", "x": 0.4, "y": 0.9},
                {"label": "Legacy connector", "x": 0.9, "y": 0.2},
                {"label": "Quantum pilot", "x": 0.1, "y": 0.3}
            ]
        },
        "financial_health": {
            "ratios": ["Liquidity", "Leverage", "Margin", "Growth", "Cash conversion"],
            "profiles": [
                {"name": "Acme", "values": [7, 6, 8, 7, 5]},
                {"name": "Peer median", "values": [6, 7, 6, 5, 6]}
            ]
        },
        "strategic_recommendations": {
            "priorities": [
                {"label": "Expand enterprise sales", "value": 9},
                {"label": "Diversify suppliers", "value": 8},
                {"label": "Launch AI copilots", "value": 7.5},
                {"label": "Enter LATAM", "value": 4}
            ]
        },
        "implementation_roadmap": {
            "phases": [
                {"label": "Discovery", "value": 4},
                {"label": "Pilot", "value": 10},
                {"label": "Rollout", "value": 16},
                {"label": "Optimization", "value": 8}
            ]
        }
    })
}
