pub mod fs;
pub mod html;
pub mod web;
