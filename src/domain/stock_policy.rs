// src/domain/stock_policy.rs

use std::collections::{BTreeMap, HashMap};

use crate::{common::error::AppError, models::catalog::Product};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockOutcome {
    /// Produto continua no catálogo com o novo saldo
    Remaining(i32),
    /// Saldo chegou exatamente a zero: produto sai do catálogo
    RemoveFromCatalog,
}

/// Política de estoque zerado na aceitação de um pedido.
///
/// Quando a baixa deixa o saldo em exatamente zero o produto é apagado do
/// catálogo (não apenas desativado).
pub fn settle_stock(current: i32, ordered: i32) -> StockOutcome {
    match current - ordered {
        0 => StockOutcome::RemoveFromCatalog,
        remaining => StockOutcome::Remaining(remaining),
    }
}

/// Soma a demanda por produto. Um pedido não repete produto, mas a verificação
/// de estoque não depende disso.
pub fn demand_by_product(lines: impl IntoIterator<Item = (i64, i32)>) -> BTreeMap<i64, i32> {
    let mut demand = BTreeMap::new();
    for (product_id, quantity) in lines {
        *demand.entry(product_id).or_insert(0) += quantity;
    }
    demand
}

/// Revalida o estoque de todos os produtos ANTES de qualquer baixa.
/// Produto ausente conta como sem estoque.
pub fn verify_availability(
    demand: &BTreeMap<i64, i32>,
    products: &HashMap<i64, Product>,
) -> Result<(), AppError> {
    for (product_id, wanted) in demand {
        match products.get(product_id) {
            None => {
                return Err(AppError::InvalidState(format!(
                    "O produto {} não está mais no catálogo.",
                    product_id
                )));
            }
            Some(product) if product.stock_quantity < *wanted => {
                return Err(AppError::InvalidState(format!(
                    "Estoque insuficiente para {} (disponível: {}, pedido: {}).",
                    product.name, product.stock_quantity, wanted
                )));
            }
            Some(_) => {}
        }
    }
    Ok(())
}
