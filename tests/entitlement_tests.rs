use classgate::domain::course::{Course, CourseCategory};
use classgate::domain::entitlement::{self, Decision, DenialReason};
use classgate::domain::principal::Role;
use classgate::domain::subscription::SubscriptionTier;

const ALL_ROLES: [Role; 4] = [Role::Student, Role::Teacher, Role::Admin, Role::Unknown];
const VALID_ROLES: [Role; 3] = [Role::Student, Role::Teacher, Role::Admin];
const ALL_TIERS: [SubscriptionTier; 6] = [
    SubscriptionTier::FreeStudent,
    SubscriptionTier::PremiumStudent,
    SubscriptionTier::FreeTeacher,
    SubscriptionTier::PremiumTeacher,
    SubscriptionTier::Personal,
    SubscriptionTier::Unknown,
];

fn course_set() -> Vec<Course> {
    vec![
        Course::new("python-fundamentals", CourseCategory::Coding),
        Course::new("machine-learning", CourseCategory::Ai)
            .with_minimum_tier(SubscriptionTier::PremiumStudent),
        Course::new("ui-ux-design", CourseCategory::Design)
            .with_minimum_tier(SubscriptionTier::Personal),
        Course::new("grading-workflows", CourseCategory::Business).with_audience(Role::Teacher),
        Course::new("class-analytics", CourseCategory::Business)
            .with_audience(Role::Teacher)
            .with_minimum_tier(SubscriptionTier::PremiumTeacher),
    ]
}

#[test]
fn test_evaluate_is_deterministic_over_the_full_grid() {
    for course in course_set() {
        for role in ALL_ROLES {
            for tier in ALL_TIERS {
                let first = entitlement::evaluate(role, tier, &course);
                for _ in 0..3 {
                    assert_eq!(entitlement::evaluate(role, tier, &course), first);
                }
            }
        }
    }
}

#[test]
fn test_open_course_granted_for_every_valid_role_and_tier() {
    let open = Course::new("python-fundamentals", CourseCategory::Coding);
    for role in VALID_ROLES {
        for tier in ALL_TIERS {
            assert_eq!(
                entitlement::evaluate(role, tier, &open),
                Decision::Granted,
                "role {role} tier {tier} should pass an ungated course"
            );
        }
    }
}

#[test]
fn test_teacher_family_tier_never_unlocks_teacher_gated_content_for_students() {
    // Buying the teacher-side premium plan must not move a student past a
    // teacher audience gate.
    let gated = Course::new("grading-workflows", CourseCategory::Business)
        .with_audience(Role::Teacher);
    assert_eq!(
        entitlement::evaluate(Role::Student, SubscriptionTier::PremiumTeacher, &gated),
        Decision::Denied(DenialReason::RoleGate)
    );
    assert_eq!(
        entitlement::evaluate(Role::Student, SubscriptionTier::Personal, &gated),
        Decision::Denied(DenialReason::RoleGate)
    );
}

#[test]
fn test_role_gate_evaluated_before_tier_gate() {
    let course = Course::new("class-analytics", CourseCategory::Business)
        .with_audience(Role::Teacher)
        .with_minimum_tier(SubscriptionTier::PremiumTeacher);

    // Wrong role reports the role gate even when the tier would also fail.
    assert_eq!(
        entitlement::evaluate(Role::Student, SubscriptionTier::FreeStudent, &course),
        Decision::Denied(DenialReason::RoleGate)
    );
    // Right role, insufficient tier reports the tier gate.
    assert_eq!(
        entitlement::evaluate(Role::Teacher, SubscriptionTier::FreeTeacher, &course),
        Decision::Denied(DenialReason::TierBelowMinimum)
    );
    assert_eq!(
        entitlement::evaluate(Role::Teacher, SubscriptionTier::PremiumTeacher, &course),
        Decision::Granted
    );
}

#[test]
fn test_unknown_values_always_deny() {
    for course in course_set() {
        for tier in ALL_TIERS {
            assert!(
                !entitlement::evaluate(Role::Unknown, tier, &course).is_granted(),
                "unknown role must never be granted"
            );
        }
    }

    let gated = Course::new("machine-learning", CourseCategory::Ai)
        .with_minimum_tier(SubscriptionTier::PremiumStudent);
    for role in VALID_ROLES {
        assert!(
            !entitlement::evaluate(role, SubscriptionTier::Unknown, &gated).is_granted(),
            "unknown tier must never pass a tier gate"
        );
    }
}
