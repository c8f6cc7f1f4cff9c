use super::common::*;
use crate::engagement::clients::ClientId;
use crate::engagement::referrals::domain::{QualificationEvent, ReferralStatus};

#[test]
fn stats_on_an_empty_tenant_are_all_zero() {
    let (service, _store) = build_service();

    let stats = service.stats(&tenant()).expect("stats compute");
    assert_eq!(stats.total, 0);
    assert_eq!(stats.conversion_rate, 0.0);
    assert!(stats.top_referrers.is_empty());
}

#[test]
fn stats_count_each_lifecycle_state() {
    let (service, _store) = build_service();

    referral_at(&service, ReferralStatus::Pending);
    referral_at(&service, ReferralStatus::SignedUp);
    referral_at(&service, ReferralStatus::Qualified);
    referral_at(&service, ReferralStatus::Rewarded);

    let stats = service.stats(&tenant()).expect("stats compute");
    assert_eq!(stats.total, 4);
    assert_eq!(stats.pending, 1);
    assert_eq!(stats.signed_up, 1);
    assert_eq!(stats.qualified, 1);
    assert_eq!(stats.rewarded, 1);
    // Qualified and rewarded referrals count as converted.
    assert!((stats.conversion_rate - 0.5).abs() < f64::EPSILON);
}

#[test]
fn top_referrers_rank_by_converted_then_volume() {
    let (service, _store) = build_service();

    // "busy" opens three referrals but converts none.
    for _ in 0..3 {
        let record = service
            .open_referral(&tenant(), &ClientId("client-busy".to_string()))
            .expect("opens");
        service
            .mark_signed_up(&record.id, &referred())
            .expect("signs up");
    }

    // "closer" opens one and converts it.
    let record = service
        .open_referral(&tenant(), &ClientId("client-closer".to_string()))
        .expect("opens");
    service
        .mark_signed_up(&record.id, &referred())
        .expect("signs up");
    let qualified = service
        .check_and_qualify(&record.id, QualificationEvent::FirstSession)
        .expect("qualifies");
    assert!(qualified);

    let stats = service.stats(&tenant()).expect("stats compute");
    assert_eq!(stats.top_referrers.len(), 2);
    assert_eq!(stats.top_referrers[0].referrer_id.0, "client-closer");
    assert_eq!(stats.top_referrers[0].converted, 1);
    assert_eq!(stats.top_referrers[1].referrer_id.0, "client-busy");
    assert_eq!(stats.top_referrers[1].total, 3);
}

#[test]
fn leaderboard_is_capped_at_five_referrers() {
    let (service, _store) = build_service();

    for index in 0..7 {
        let record = service
            .open_referral(&tenant(), &ClientId(format!("client-{index}")))
            .expect("opens");
        service
            .mark_signed_up(&record.id, &referred())
            .expect("signs up");
    }

    let stats = service.stats(&tenant()).expect("stats compute");
    assert_eq!(stats.total, 7);
    assert_eq!(stats.top_referrers.len(), 5);
}
