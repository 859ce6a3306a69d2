use std::collections::HashMap;

use crate::{Protected, Record};

#[derive(Clone, Debug, PartialEq, Record)]
pub struct Address {
    pub street: String,
    pub number: u32,
}

#[derive(Clone, Debug, PartialEq, Record)]
pub struct Contact {
    pub kind: String,
    pub value: String,
}

#[derive(Clone, Debug, PartialEq, Record)]
pub struct Tag {
    pub label: String,
}

#[derive(Clone, Debug, PartialEq, Record)]
pub struct Person {
    pub id: String,
    pub name: String,
    pub age: u8,
    pub score: f64,
    pub active: bool,
    pub nickname: Option<String>,
    pub address: Address,
    pub tags: Vec<Tag>,
    pub contacts: HashMap<String, Contact>,
}

#[derive(Clone, Debug, PartialEq, Record)]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub birth_year: Protected<u32>,
    pub address: Option<Address>,
    pub tier: u8,
}

#[derive(Clone, Debug, PartialEq, Record)]
pub struct Invoice {
    pub number: u32,
    pub customer: Customer,
}

#[derive(Clone, Debug, PartialEq, Record)]
pub struct Note {
    pub id: String,
    pub text: Protected<String>,
}
