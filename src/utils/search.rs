use sea_orm::sea_query::{Expr, Func, SimpleExpr};
use sea_orm::{ColumnTrait, Condition};

/// Case-insensitive substring match on a column.
pub fn icontains<C: ColumnTrait>(col: C, needle: &str) -> SimpleExpr {
    Expr::expr(Func::lower(Expr::col((col.entity_name(), col))))
        .like(format!("%{}%", escape_like(&needle.to_lowercase())))
}

/// OR of [`icontains`] over several columns.
pub fn any_icontains<C: ColumnTrait>(cols: &[C], needle: &str) -> Condition {
    cols.iter().fold(Condition::any(), |cond, col| {
        cond.add(icontains(*col, needle))
    })
}

fn escape_like(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_wildcards_are_escaped() {
        assert_eq!(escape_like("50%_off"), "50\\%\\_off");
        assert_eq!(escape_like("milk"), "milk");
    }
}
