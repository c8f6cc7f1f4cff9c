use super::domain::Criterion;

/// Canonical badge template used when seeding a tenant.
#[derive(Debug, Clone, PartialEq)]
pub struct BadgeTemplate {
    pub name: &'static str,
    pub criterion: Criterion,
}

/// The fixed catalog of 8 canonical badges, one per criterion kind.
///
/// Display names are Czech to match the product's end-user locale.
pub fn default_badge_templates() -> Vec<BadgeTemplate> {
    vec![
        BadgeTemplate {
            name: "První lekce",
            criterion: Criterion::FirstSession,
        },
        BadgeTemplate {
            name: "Desítka v kapse",
            criterion: Criterion::SessionsCompleted { required: 10 },
        },
        BadgeTemplate {
            name: "Ranní ptáče",
            criterion: Criterion::MorningSessions { required: 10 },
        },
        BadgeTemplate {
            name: "Víkendový bojovník",
            criterion: Criterion::WeekendSessions { required: 10 },
        },
        BadgeTemplate {
            name: "Splněný cíl",
            criterion: Criterion::WeightGoal,
        },
        BadgeTemplate {
            name: "Měsíc v kuse",
            criterion: Criterion::ConsecutiveWeeks { required: 4 },
        },
        BadgeTemplate {
            name: "Pod kontrolou",
            criterion: Criterion::MeasurementLogged { required: 5 },
        },
        BadgeTemplate {
            name: "Věrný klient",
            criterion: Criterion::CreditsPurchased {
                minimum_spend: 5000,
            },
        },
    ]
}
