// src/domain/pricing.rs

use std::collections::{HashMap, HashSet};

use rust_decimal::Decimal;

use crate::{
    common::error::AppError,
    models::{
        catalog::Product,
        order::{OrderItem, OrderLinePayload},
    },
};

/// Linha já validada e com o preço congelado (snapshot).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedLine {
    pub product_id: i64,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub subtotal: Decimal,
}

/// Valida todas as linhas contra o catálogo do fornecedor e calcula os subtotais.
///
/// Tudo ou nada: a primeira linha inválida derruba o pedido inteiro, então o
/// chamador só escreve algo quando recebe `Ok`.
pub fn price_order_lines(
    supplier_id: i64,
    lines: &[OrderLinePayload],
    catalog: &[Product],
) -> Result<Vec<PricedLine>, AppError> {
    if lines.is_empty() {
        return Err(AppError::ValidationFailed(
            "O pedido deve conter pelo menos um item.".into(),
        ));
    }

    let mut seen = HashSet::with_capacity(lines.len());
    if !lines.iter().all(|line| seen.insert(line.product_id)) {
        return Err(AppError::ValidationFailed(
            "Um mesmo produto não pode aparecer duas vezes no pedido.".into(),
        ));
    }

    let by_id: HashMap<i64, &Product> = catalog
        .iter()
        .filter(|p| p.supplier_id == supplier_id)
        .map(|p| (p.id, p))
        .collect();

    let priced = lines
        .iter()
        .map(|line| {
            let product = by_id.get(&line.product_id).ok_or_else(|| {
                AppError::ValidationFailed(format!(
                    "Produto {} não encontrado ou não pertence a este fornecedor.",
                    line.product_id
                ))
            })?;

            if !product.is_active {
                return Err(AppError::ValidationFailed(format!(
                    "O produto {} não está disponível.",
                    product.name
                )));
            }

            if line.quantity < product.min_order_quantity {
                return Err(AppError::ValidationFailed(format!(
                    "O produto {} exige quantidade mínima de {}.",
                    product.name, product.min_order_quantity
                )));
            }

            if line.quantity > product.stock_quantity {
                return Err(AppError::ValidationFailed(format!(
                    "O produto {} não tem estoque suficiente (disponível: {}).",
                    product.name, product.stock_quantity
                )));
            }

            let subtotal = Decimal::from(line.quantity)
                .checked_mul(product.price)
                .filter(|subtotal| *subtotal <= MAX_SUBTOTAL)
                .ok_or_else(|| {
                    AppError::ValidationFailed(format!(
                        "O subtotal do produto {} excede o limite permitido.",
                        product.name
                    ))
                })?;

            Ok(PricedLine {
                product_id: product.id,
                quantity: line.quantity,
                unit_price: product.price,
                subtotal,
            })
        })
        .collect::<Result<Vec<_>, AppError>>()?;

    checked_sum(priced.iter().map(|line| line.subtotal))?;
    Ok(priced)
}

/// Teto da coluna `order_items.subtotal` (NUMERIC(12, 2)).
pub const MAX_SUBTOTAL: Decimal = Decimal::from_parts(3_567_587_327, 232, 0, false, 2);

/// Total do pedido: soma viva dos subtotais. Nunca é gravado.
pub fn order_total(items: &[OrderItem]) -> Result<Decimal, AppError> {
    checked_sum(items.iter().map(|item| item.subtotal))
}

fn checked_sum(mut values: impl Iterator<Item = Decimal>) -> Result<Decimal, AppError> {
    values
        .try_fold(Decimal::ZERO, |acc, value| acc.checked_add(value))
        .ok_or_else(|| {
            AppError::ValidationFailed("O total do pedido excede o limite permitido.".into())
        })
}
