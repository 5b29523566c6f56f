use super::*;

#[test]
fn test_shallow_recursion() {
    fn factorial(n: u64) -> u64 {
        ensure_sufficient_stack(|| if n <= 1 { 1 } else { n * factorial(n - 1) })
    }

    assert_eq!(factorial(10), 3_628_800);
}

#[test]
fn test_deep_recursion() {
    // This would overflow without stack growth
    fn deep_recurse(n: u64) -> u64 {
        ensure_sufficient_stack(|| if n == 0 { 0 } else { deep_recurse(n - 1) + 1 })
    }

    assert_eq!(deep_recurse(100_000), 100_000);
}

#[test]
fn test_budget_charges_and_releases() {
    let mut budget = StackBudget::new(100);
    assert!(budget.enter(40).is_ok());
    assert!(budget.enter(40).is_ok());
    assert_eq!(budget.enter(40).map_err(|e| e.used), Err(80));
    budget.exit(40);
    budget.exit(40);
    assert!(budget.enter(100).is_ok());
}

#[test]
fn test_budget_exhaustion_charges_nothing() {
    let mut budget = StackBudget::new(100);
    assert!(budget.enter(64).is_ok());
    let err = budget.enter(64);
    assert_eq!(
        err,
        Err(StackExhausted {
            limit: 100,
            used: 64,
            requested: 64
        })
    );
    assert!(budget.enter(36).is_ok());
}

#[test]
fn test_budgeted_recursion_stops_at_limit() {
    fn depth(budget: &mut StackBudget, n: u32) -> Result<u32, StackExhausted> {
        budget.enter(16)?;
        let result = ensure_sufficient_stack(|| if n == 0 { Ok(0) } else { depth(budget, n - 1) });
        budget.exit(16);
        result.map(|d| d + 1)
    }

    let mut budget = StackBudget::new(16 * 10);
    assert_eq!(depth(&mut budget, 9), Ok(10));
    assert!(depth(&mut budget, 10).is_err());
    assert_eq!(depth(&mut budget, 9), Ok(10));
}

#[test]
fn test_zero_budget_rejects_everything() {
    let mut budget = StackBudget::new(0);
    assert!(budget.enter(1).is_err());
    assert!(budget.enter(0).is_ok());
}
