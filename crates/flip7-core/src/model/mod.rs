pub mod card;
pub mod deck;
pub mod face;
pub mod hand;
pub mod modifiers;
pub mod observation;
pub mod revealed;
