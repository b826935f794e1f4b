// src/models/catalog.rs

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

// --- Produto do catálogo de um fornecedor ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: i64,
    pub supplier_id: i64,
    #[schema(example = "Tomate Italiano")]
    pub name: String,
    pub description: Option<String>,
    #[schema(example = "kg")]
    pub unit: String,
    #[schema(example = "7.90")]
    pub price: Decimal,
    pub stock_quantity: i32,
    pub min_order_quantity: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub fn index_by_id(products: Vec<Product>) -> HashMap<i64, Product> {
    products.into_iter().map(|p| (p.id, p)).collect()
}

#[derive(Debug, Clone)]
pub struct NewProduct {
    pub supplier_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub unit: String,
    pub price: Decimal,
    pub stock_quantity: i32,
    pub min_order_quantity: i32,
}

// ---
// Validação Customizada
// ---
/// Teto da coluna `products.price` (NUMERIC(10, 2)).
pub const MAX_PRICE: Decimal = Decimal::from_parts(1_410_065_407, 2, 0, false, 2);

fn validate_price(val: &Decimal) -> Result<(), ValidationError> {
    let message = if val.is_sign_negative() {
        "O preço não pode ser negativo."
    } else if val.normalize().scale() > 2 {
        "O preço aceita no máximo duas casas decimais."
    } else if *val > MAX_PRICE {
        "O preço excede o limite permitido."
    } else {
        return Ok(());
    };

    let mut err = ValidationError::new("price");
    err.message = Some(message.into());
    Err(err)
}

fn default_min_order_quantity() -> i32 {
    1
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductPayload {
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    pub name: String,
    pub description: Option<String>,
    #[validate(length(min = 1, message = "A unidade é obrigatória."))]
    pub unit: String,
    #[validate(custom(function = "validate_price"))]
    pub price: Decimal,
    #[validate(range(min = 0, message = "O estoque não pode ser negativo."))]
    pub stock_quantity: i32,
    #[validate(range(min = 1, message = "O pedido mínimo deve ser pelo menos 1."))]
    #[serde(default = "default_min_order_quantity")]
    pub min_order_quantity: i32,
}

// Atualização parcial: só os campos enviados mudam
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductPayload {
    #[validate(length(min = 1, message = "O nome não pode ser vazio."))]
    pub name: Option<String>,
    pub description: Option<String>,
    #[validate(length(min = 1, message = "A unidade não pode ser vazia."))]
    pub unit: Option<String>,
    #[validate(custom(function = "validate_price"))]
    pub price: Option<Decimal>,
    #[validate(range(min = 0, message = "O estoque não pode ser negativo."))]
    pub stock_quantity: Option<i32>,
    #[validate(range(min = 1, message = "O pedido mínimo deve ser pelo menos 1."))]
    pub min_order_quantity: Option<i32>,
    pub is_active: Option<bool>,
}

impl UpdateProductPayload {
    /// Aplica os campos presentes sobre o produto atual.
    pub fn apply_to(self, product: &mut Product) {
        if let Some(name) = self.name {
            product.name = name;
        }
        if let Some(description) = self.description {
            product.description = Some(description);
        }
        if let Some(unit) = self.unit {
            product.unit = unit;
        }
        if let Some(price) = self.price {
            product.price = price;
        }
        if let Some(stock) = self.stock_quantity {
            product.stock_quantity = stock;
        }
        if let Some(min) = self.min_order_quantity {
            product.min_order_quantity = min;
        }
        if let Some(active) = self.is_active {
            product.is_active = active;
        }
    }
}
