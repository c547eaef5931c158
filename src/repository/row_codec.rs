// ==========================================
// 校务运营管理系统 - 行字段编解码
// ==========================================
// 时间戳: %Y-%m-%d %H:%M:%S%.6f (字典序 = 时间序，结转比较依赖此性质)
// 日期:   %Y-%m-%d
// 时间:   %H:%M (兼容读取 %H:%M:%S)
// ==========================================

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rusqlite::types::Type;
use rusqlite::Row;

pub const TS_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";
pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIME_FORMAT: &str = "%H:%M";

pub fn format_ts(ts: &NaiveDateTime) -> String {
    ts.format(TS_FORMAT).to_string()
}

pub fn format_date(date: &NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn format_time(time: &NaiveTime) -> String {
    time.format(TIME_FORMAT).to_string()
}

/// 当前 UTC 时间 (写入 created_at)；不随夏令时回拨，保证先写入的记录时间戳不大于后写入的
pub fn now_ts() -> NaiveDateTime {
    chrono::Utc::now().naive_utc()
}

fn conversion_error(idx: usize, e: chrono::ParseError) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))
}

pub fn parse_ts(idx: usize, raw: &str) -> rusqlite::Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S"))
        .map_err(|e| conversion_error(idx, e))
}

pub fn parse_date(idx: usize, raw: &str) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT).map_err(|e| conversion_error(idx, e))
}

pub fn parse_time(idx: usize, raw: &str) -> rusqlite::Result<NaiveTime> {
    NaiveTime::parse_from_str(raw, TIME_FORMAT)
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .map_err(|e| conversion_error(idx, e))
}

pub fn get_ts(row: &Row, idx: usize) -> rusqlite::Result<NaiveDateTime> {
    parse_ts(idx, &row.get::<_, String>(idx)?)
}

pub fn get_date(row: &Row, idx: usize) -> rusqlite::Result<NaiveDate> {
    parse_date(idx, &row.get::<_, String>(idx)?)
}

pub fn get_opt_date(row: &Row, idx: usize) -> rusqlite::Result<Option<NaiveDate>> {
    row.get::<_, Option<String>>(idx)?
        .map(|raw| parse_date(idx, &raw))
        .transpose()
}

pub fn get_time(row: &Row, idx: usize) -> rusqlite::Result<NaiveTime> {
    parse_time(idx, &row.get::<_, String>(idx)?)
}

pub fn get_opt_time(row: &Row, idx: usize) -> rusqlite::Result<Option<NaiveTime>> {
    row.get::<_, Option<String>>(idx)?
        .map(|raw| parse_time(idx, &raw))
        .transpose()
}
