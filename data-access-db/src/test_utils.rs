//! Shared fixtures for the in-memory store tests

use rand::Rng;
use uuid::Uuid;

use crate::models::Identifiable;
use crate::store::MemoryContext;

pub const MAX_PRICE: i32 = 500;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub price: i32,
}

impl Identifiable for Product {
    type Id = Uuid;

    fn get_id(&self) -> Uuid {
        self.id
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub name: String,
}

impl User {
    pub fn new(name: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
        }
    }
}

impl Identifiable for User {
    type Id = Uuid;

    fn get_id(&self) -> Uuid {
        self.id
    }
}

pub fn product(name: &str, price: i32) -> Product {
    Product {
        id: Uuid::new_v4(),
        name: name.to_string(),
        price,
    }
}

/// `count` products with random prices in `1..=MAX_PRICE`
pub fn random_products(count: usize) -> Vec<Product> {
    let mut rng = rand::thread_rng();
    (0..count)
        .map(|i| product(&format!("Product {i}"), rng.gen_range(1..=MAX_PRICE)))
        .collect()
}

/// Context with product and user sets holding `products`, already saved
pub fn seeded_context(products: Vec<Product>) -> MemoryContext {
    let context = MemoryContext::named("test").with_set::<Product>().with_set::<User>();
    context.add_range(products).expect("product set is registered");
    context.save_changes().expect("seed products save");
    context
}

/// Context seeded with products priced `0..count`, stored in reverse price order
pub fn sequential_context(count: i32) -> MemoryContext {
    seeded_context(
        (0..count)
            .rev()
            .map(|price| product(&format!("Product {price}"), price))
            .collect(),
    )
}
