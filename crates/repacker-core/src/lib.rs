//! repacker-core
//!
//! シミュレーションが書き出す HDF5 出力を監視し、外部の repack ツールで
//! その場で圧縮するための部品。
//!
//! # モジュール構成
//! - **domain**: 候補ファイル、census、処理結果、エラー
//! - **config**: デプロイ設定（TOML）と producer 設定（RAMSIN）の読み取り
//! - **ports**: 抽象化レイヤー（Clock, FileSystem, CommandRunner, Compressor, LivenessProbe, RemoteCopier）
//! - **impls**: ports の実装（本番用とテスト用）
//! - **app**: repack パス、live mode のポーリングループ、post-hoc 実行、builder
//! - **observability**: 実行サマリ

pub mod app;
pub mod config;
pub mod domain;
pub mod impls;
pub mod observability;
pub mod ports;

#[cfg(test)]
mod testing;
