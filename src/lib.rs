//! 学校図書館の貸出台帳と在庫の整合性を保つサービス
//!
//! 在庫（貸出可能数・貸出中数）は保存せず、書籍の所蔵数と未返却の貸出から毎回導出する。

pub mod adapter;
pub mod application;
pub mod domain;
