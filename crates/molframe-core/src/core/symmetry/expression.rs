//! Assembly generator expressions such as `(1-5)(6,7)` or `1,2,3`.
//!
//! Each parenthesized group is a comma list whose integer ranges `a-b` are expanded. The
//! expression denotes the Cartesian product of its groups, first group outermost.

use super::error::SymmetryError;

/// Splits an expression into its groups with ranges expanded.
pub fn parse_operator_groups(expression: &str) -> Result<Vec<Vec<String>>, SymmetryError> {
    let trimmed = expression.trim();
    if trimmed.is_empty() {
        return Err(SymmetryError::InvalidOperatorExpression(expression.to_string()));
    }

    let raw_groups: Vec<&str> = if trimmed.contains('(') {
        let mut groups = Vec::new();
        let mut rest = trimmed;
        while let Some(open) = rest.find('(') {
            let close = rest[open..]
                .find(')')
                .map(|c| open + c)
                .ok_or_else(|| SymmetryError::InvalidOperatorExpression(expression.to_string()))?;
            groups.push(&rest[open + 1..close]);
            rest = &rest[close + 1..];
        }
        if !rest.trim().is_empty() {
            return Err(SymmetryError::InvalidOperatorExpression(expression.to_string()));
        }
        groups
    } else {
        vec![trimmed]
    };

    raw_groups
        .into_iter()
        .map(|group| expand_group(group, expression))
        .collect()
}

fn expand_group(group: &str, expression: &str) -> Result<Vec<String>, SymmetryError> {
    let mut ids = Vec::new();
    for item in group.split(',').map(str::trim) {
        if item.is_empty() {
            return Err(SymmetryError::InvalidOperatorExpression(expression.to_string()));
        }
        match parse_range(item) {
            Some((start, end)) => ids.extend((start..=end).map(|i| i.to_string())),
            None => ids.push(item.to_string()),
        }
    }
    Ok(ids)
}

fn parse_range(item: &str) -> Option<(i64, i64)> {
    let (start, end) = item.split_once('-')?;
    let start: i64 = start.trim().parse().ok()?;
    let end: i64 = end.trim().parse().ok()?;
    (start <= end).then_some((start, end))
}

/// Every combination of one id per group, in generation order.
pub fn expand_operator_products(groups: &[Vec<String>]) -> Vec<Vec<String>> {
    let mut products: Vec<Vec<String>> = vec![Vec::new()];
    for group in groups {
        let mut next = Vec::with_capacity(products.len() * group.len());
        for prefix in &products {
            for id in group {
                let mut combination = prefix.clone();
                combination.push(id.clone());
                next.push(combination);
            }
        }
        products = next;
    }
    products.retain(|p| !p.is_empty());
    products
}
