//! Field-alias mapping from server JSON to canonical commerce types.
//!
//! The API is not consistent about field names: the same value shows up in
//! camelCase or snake_case, under older names, or nested one level down.
//! Each entity gets one function here that knows every spelling; nothing
//! past this module looks at raw JSON.
//!
//! Scalars are read leniently (a price may arrive as `49.99` or `"49.99"`).
//! A missing or unreadable price reads as zero. List endpoints that do not
//! answer with an array fail with [`CommerceError::MalformedPayload`]; a bad
//! entry inside a list is skipped and logged.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use pharma_commerce::catalog::CatalogItem;
use pharma_commerce::orders::{Order, OrderLine, OrderStatus};
use pharma_commerce::pricing::{DiscountDescriptor, DiscountValue, Percent};
use pharma_commerce::remote::{AnalyticsOverview, TopSelling, User};
use pharma_commerce::session::{CustomerContact, Role};
use pharma_commerce::money::{decimal_from_f64, parse_decimal};
use pharma_commerce::{CommerceError, Money, ProductId, UserId};
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use std::str::FromStr;
use tracing::warn;

type Object = Map<String, Value>;

/// Name used for order lines the server sends without one.
pub const UNKNOWN_MEDICINE: &str = "Unknown medicine";

/// A medicine from `/medicines` or `/medicines/{id}`.
pub fn catalog_item(value: &Value) -> Result<CatalogItem, CommerceError> {
    let obj = object(value, "medicine")?;
    let id = pick_text(obj, &["id", "medicineId"])
        .ok_or_else(|| malformed("medicine without an id"))?;

    Ok(CatalogItem {
        id: ProductId::new(id),
        name: pick_text(obj, &["name", "medicineName"]).unwrap_or_default(),
        category: pick_text(obj, &["category"]).unwrap_or_default(),
        base_price: pick_money(obj, &["price", "sellPrice", "basePrice"]),
        buy_price: pick_money(obj, &["buyPrice", "costPrice"]),
        stock: clamp_u32(pick(obj, &["stock", "quantity", "qty"]).and_then(count).unwrap_or(0)),
        discount: discount(obj),
        expiry: pick(obj, &["expiry", "expiryDate"]).and_then(date),
    })
}

pub fn catalog_items(value: &Value) -> Result<Vec<CatalogItem>, CommerceError> {
    list(value, "medicines", catalog_item)
}

/// The discount fields of a medicine.
///
/// Only PERCENT and FLAT (and their aliases) discount anything; a missing
/// or unknown kind never does. Values keep every digit the server sent, and
/// the descriptor is taken as sent; pricing clamps whatever is out of range.
pub fn discount(obj: &Object) -> DiscountDescriptor {
    let raw_value = pick(obj, &["discountValue"]);
    let kind = pick_text(obj, &["discountType"]).map(|k| k.to_ascii_uppercase());

    let value = match kind.as_deref() {
        Some("PERCENT") | Some("PERCENTAGE") => raw_value
            .and_then(percent)
            .map(DiscountValue::Percent)
            .unwrap_or(DiscountValue::Unrecognized),
        Some("FLAT") | Some("FIXED") | Some("AMOUNT") => raw_value
            .and_then(exact)
            .map(DiscountValue::Flat)
            .unwrap_or(DiscountValue::Unrecognized),
        None | Some(_) => DiscountValue::Unrecognized,
    };

    DiscountDescriptor {
        active: pick(obj, &["discountActive", "isDiscountActive"])
            .map(boolean)
            .unwrap_or(false),
        value,
        window_start: pick(obj, &["discountStart", "discountStartDate"]).and_then(date),
        window_end: pick(obj, &["discountEnd", "discountEndDate"]).and_then(date),
    }
}

/// One order from any of the order endpoints.
pub fn order(value: &Value) -> Result<Order, CommerceError> {
    let obj = object(value, "order")?;
    let id = pick_text(obj, &["id", "orderId"]).ok_or_else(|| malformed("order without an id"))?;

    let status = match pick_text(obj, &["status", "orderStatus"]) {
        Some(raw) => OrderStatus::from_str(&raw)
            .map_err(|_| malformed(format!("order {} has unknown status {:?}", id, raw)))?,
        None => OrderStatus::Pending,
    };

    let user_id = pick_text(obj, &["userId", "customerId"])
        .or_else(|| nested(obj, "user", &["id", "userId"]).and_then(text))
        .unwrap_or_default();

    let lines: Vec<OrderLine> = pick(obj, &["items", "orderItems"])
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(Value::as_object).map(order_line).collect())
        .unwrap_or_default();

    let total_amount = pick(obj, &["totalAmount", "total"])
        .and_then(money)
        .unwrap_or_else(|| lines.iter().map(|l| l.line_total).sum());

    let mut order = Order::new(id, user_id, lines);
    order.total_amount = total_amount;
    order.status = status;
    order.pre_cancel_status = pick_text(obj, &["preCancelStatus", "previousStatus", "statusBeforeCancel"])
        .and_then(|s| OrderStatus::from_str(&s).ok());
    order.cancel_reason = pick_text(obj, &["cancelReason"]);
    order.cancel_requested_at = pick(obj, &["cancelRequestedAt"]).and_then(timestamp);
    order.cancelled_at = pick(obj, &["cancelledAt", "canceledAt"]).and_then(timestamp);
    order.created_at = pick(obj, &["createdAt", "orderDate"]).and_then(timestamp);
    order.customer = CustomerContact {
        name: pick_text(obj, &["customerName"]),
        phone: pick_text(obj, &["customerPhone"]),
        email: pick_text(obj, &["customerEmail"]),
    };
    Ok(order)
}

pub fn orders(value: &Value) -> Result<Vec<Order>, CommerceError> {
    list(value, "orders", order)
}

fn order_line(obj: &Object) -> OrderLine {
    let product_id = pick_text(obj, &["medicineId"])
        .or_else(|| nested(obj, "medicine", &["id"]).and_then(text))
        .or_else(|| pick_text(obj, &["id"]))
        .unwrap_or_default();
    let name = pick_text(obj, &["medicineName"])
        .or_else(|| nested(obj, "medicine", &["name"]).and_then(text))
        .or_else(|| pick_text(obj, &["name"]))
        .unwrap_or_else(|| UNKNOWN_MEDICINE.to_string());
    let quantity = clamp_u32(pick(obj, &["quantity", "qty"]).and_then(count).unwrap_or(0));
    let unit_price = pick(obj, &["unitPrice", "medicinePrice", "price"])
        .and_then(money)
        .unwrap_or_default();
    let line_total = pick(obj, &["lineTotal"])
        .and_then(money)
        .unwrap_or_else(|| unit_price * i64::from(quantity));

    OrderLine {
        product_id: ProductId::new(product_id),
        name,
        quantity,
        unit_price,
        line_total,
    }
}

/// A user from `/admin/users`.
pub fn user(value: &Value) -> Result<User, CommerceError> {
    let obj = object(value, "user")?;
    let id = pick_text(obj, &["id", "userId"]).ok_or_else(|| malformed("user without an id"))?;

    let full_name = [pick_text(obj, &["firstName"]), pick_text(obj, &["lastName"])]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" ");
    let name = pick_text(obj, &["name", "fullName"])
        .or_else(|| Some(full_name).filter(|n| !n.is_empty()))
        .unwrap_or_default();

    let role = pick_text(obj, &["role"])
        .and_then(|r| {
            let r = r.to_ascii_uppercase();
            Role::from_str(r.strip_prefix("ROLE_").unwrap_or(&r)).ok()
        })
        .unwrap_or_default();

    Ok(User {
        id: UserId::new(id),
        name,
        email: pick_text(obj, &["email", "emailAddress", "username"]).unwrap_or_default(),
        phone: pick_text(obj, &["phone", "mobile"]),
        role,
    })
}

pub fn users(value: &Value) -> Result<Vec<User>, CommerceError> {
    list(value, "users", user)
}

/// Headline figures from `/admin/analytics/overview`.
pub fn overview(value: &Value) -> Result<AnalyticsOverview, CommerceError> {
    let obj = object(value, "analytics overview")?;
    let n = |keys: &[&str]| pick(obj, keys).and_then(count).unwrap_or(0);
    Ok(AnalyticsOverview {
        total_revenue: pick_money(obj, &["totalRevenue", "revenue"]),
        total_profit: pick_money(obj, &["totalProfit", "profit"]),
        total_units_sold: n(&["totalUnitsSold", "unitsSold"]),
        total_orders: n(&["totalOrders"]),
        pending_orders: n(&["pendingOrders"]),
        delivered_orders: n(&["deliveredOrders"]),
        cancelled_orders: n(&["cancelledOrders"]),
    })
}

/// Rows from `/admin/analytics/top-selling`.
pub fn top_selling(value: &Value) -> Result<Vec<TopSelling>, CommerceError> {
    list(value, "top selling", |row| {
        let obj = object(row, "top selling row")?;
        Ok(TopSelling {
            medicine_name: pick_text(obj, &["medicineName", "name"])
                .unwrap_or_else(|| UNKNOWN_MEDICINE.to_string()),
            total_qty: pick(obj, &["totalQty", "quantity"]).and_then(count).unwrap_or(0),
            total_revenue: pick_money(obj, &["totalRevenue", "revenue"]),
        })
    })
}

fn list<T>(
    value: &Value,
    what: &str,
    parse: impl Fn(&Value) -> Result<T, CommerceError>,
) -> Result<Vec<T>, CommerceError> {
    let entries = value
        .as_array()
        .ok_or_else(|| malformed(format!("{} did not come back as a list", what)))?;
    Ok(entries
        .iter()
        .enumerate()
        .filter_map(|(i, entry)| match parse(entry) {
            Ok(item) => Some(item),
            Err(e) => {
                warn!(list = what, index = i, error = %e, "skipping unreadable entry");
                None
            }
        })
        .collect())
}

fn malformed(message: impl Into<String>) -> CommerceError {
    CommerceError::MalformedPayload(message.into())
}

fn object<'a>(value: &'a Value, what: &str) -> Result<&'a Object, CommerceError> {
    value
        .as_object()
        .ok_or_else(|| malformed(format!("{} is not an object", what)))
}

/// `discountStart` -> `discount_start`.
fn snake_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    for c in key.chars() {
        if c.is_ascii_uppercase() {
            out.push('_');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// First non-null value under any of `keys`, each tried as written and in
/// snake_case.
fn pick<'a>(obj: &'a Object, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|key| {
        obj.get(*key)
            .filter(|v| !v.is_null())
            .or_else(|| obj.get(&snake_case(key)).filter(|v| !v.is_null()))
    })
}

fn nested<'a>(obj: &'a Object, outer: &str, keys: &[&str]) -> Option<&'a Value> {
    pick(obj, &[outer]).and_then(Value::as_object).and_then(|inner| pick(inner, keys))
}

fn pick_text(obj: &Object, keys: &[&str]) -> Option<String> {
    pick(obj, keys).and_then(text)
}

fn pick_money(obj: &Object, keys: &[&str]) -> Money {
    pick(obj, keys).and_then(money).unwrap_or_default()
}

fn text(value: &Value) -> Option<String> {
    let s = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    Some(s).filter(|s| !s.is_empty())
}

fn money(value: &Value) -> Option<Money> {
    match value {
        Value::Number(n) => n.as_f64().and_then(|f| Money::from_f64(f).ok()),
        Value::String(s) => Money::parse(s).ok(),
        _ => None,
    }
}

fn percent(value: &Value) -> Option<Percent> {
    exact(value).map(Percent::new)
}

/// A number with all its digits, unrounded.
fn exact(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => n.as_f64().and_then(|f| decimal_from_f64(f).ok()),
        Value::String(s) => parse_decimal(s).ok(),
        _ => None,
    }
}

fn count(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.max(0.0) as u64)),
        Value::String(s) => s.trim().parse::<f64>().ok().map(|f| f.max(0.0) as u64),
        _ => None,
    }
}

fn clamp_u32(n: u64) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

fn boolean(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => matches!(s.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes"),
        _ => false,
    }
}

/// Dates arrive as `2025-06-30` or as a full timestamp; only the day counts.
fn date(value: &Value) -> Option<NaiveDate> {
    let s = value.as_str()?.trim();
    let day = s.get(..10).unwrap_or(s);
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

/// RFC 3339, a zoneless local timestamp (read as UTC), a bare date, or epoch
/// milliseconds.
fn timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Number(n) => n.as_i64().and_then(|ms| Utc.timestamp_millis_opt(ms).single()),
        Value::String(s) => {
            let s = s.trim();
            DateTime::parse_from_rfc3339(s)
                .map(|t| t.with_timezone(&Utc))
                .ok()
                .or_else(|| {
                    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
                        .ok()
                        .map(|t| t.and_utc())
                })
                .or_else(|| {
                    NaiveDate::parse_from_str(s, "%Y-%m-%d")
                        .ok()
                        .and_then(|d| d.and_hms_opt(0, 0, 0))
                        .map(|t| t.and_utc())
                })
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pharma_commerce::OrderId;
    use serde_json::json;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_medicine_camel_case() {
        let item = catalog_item(&json!({
            "id": 12,
            "name": "Napa Extra",
            "category": "Analgesic",
            "price": 49.99,
            "buyPrice": "30",
            "quantity": 40,
            "expiryDate": "2026-01-31T00:00:00",
            "discountActive": true,
            "discountType": "PERCENT",
            "discountValue": 12.5,
            "discountStart": "2025-06-01",
            "discountEnd": "2025-06-30"
        }))
        .unwrap();

        assert_eq!(item.id, ProductId::new("12"));
        assert_eq!(item.base_price, Money::new(4999));
        assert_eq!(item.buy_price, Money::new(3000));
        assert_eq!(item.stock, 40);
        assert_eq!(item.expiry, Some(day(2026, 1, 31)));
        assert!(item.discount.active);
        assert_eq!(item.discount.value, DiscountValue::Percent(Percent::from_hundredths(1250)));
        assert_eq!(item.discount.window_start, Some(day(2025, 6, 1)));
        assert_eq!(item.discount.window_end, Some(day(2025, 6, 30)));
        assert_eq!(item.final_price(day(2025, 6, 15)), Money::new(4374));
    }

    #[test]
    fn test_medicine_snake_case_and_flat() {
        let item = catalog_item(&json!({
            "medicine_id": "7",
            "name": "Seclo",
            "sell_price": "120.00",
            "stock": 3,
            "discount_active": "true",
            "discount_type": "flat",
            "discount_value": "20"
        }))
        .unwrap();

        assert_eq!(item.id, ProductId::new("7"));
        assert_eq!(item.base_price, Money::new(12000));
        assert_eq!(item.discount.value, DiscountValue::Flat(Decimal::from(20)));
        assert_eq!(item.final_price(day(2025, 6, 15)), Money::new(10000));
    }

    #[test]
    fn test_unknown_discount_kind_never_discounts() {
        let item = catalog_item(&json!({
            "id": 1, "price": 100, "discountActive": true,
            "discountType": "BOGO", "discountValue": 50
        }))
        .unwrap();
        assert_eq!(item.discount.value, DiscountValue::Unrecognized);
        assert_eq!(item.final_price(day(2025, 6, 15)), Money::new(10000));
    }

    #[test]
    fn test_missing_discount_kind_never_discounts() {
        let item = catalog_item(&json!({
            "id": 3, "price": 100.00, "discountActive": true, "discountValue": 10
        }))
        .unwrap();
        assert_eq!(item.discount.value, DiscountValue::Unrecognized);
        assert_eq!(item.final_price(day(2025, 6, 15)), Money::new(10000));
        assert_eq!(item.badge(day(2025, 6, 15)), None);
    }

    #[test]
    fn test_discount_values_keep_their_digits() {
        let pct = catalog_item(&json!({
            "id": 4, "price": 200.00, "discountActive": true,
            "discountType": "PERCENT", "discountValue": 0.005
        }))
        .unwrap();
        assert_eq!(pct.discount.value, DiscountValue::Percent(Percent::new(Decimal::new(5, 3))));
        assert_eq!(pct.final_price(day(2025, 6, 15)), Money::new(19_999));

        let flat = catalog_item(&json!({
            "id": 5, "price": "1.00", "discountActive": true,
            "discountType": "FLAT", "discountValue": "0.005"
        }))
        .unwrap();
        assert_eq!(flat.discount.value, DiscountValue::Flat(Decimal::new(5, 3)));
        assert_eq!(flat.final_price(day(2025, 6, 15)), Money::new(100));
    }

    #[test]
    fn test_missing_price_reads_as_zero() {
        let item = catalog_item(&json!({"id": 2, "name": "Loose", "price": "n/a"})).unwrap();
        assert_eq!(item.base_price, Money::zero());
        assert!(!item.discount.active);
    }

    #[test]
    fn test_medicine_list_skips_bad_entries() {
        let items = catalog_items(&json!([{"id": 1, "price": 5}, {"name": "no id"}, 42])).unwrap();
        assert_eq!(items.len(), 1);

        let err = catalog_items(&json!({"content": []})).unwrap_err();
        assert!(matches!(err, CommerceError::MalformedPayload(_)));
    }

    #[test]
    fn test_order_with_nested_items() {
        let order = order(&json!({
            "id": 101,
            "user": {"id": 9},
            "status": "cancel_requested",
            "previousStatus": "PAID",
            "cancelReason": "Ordered by mistake",
            "cancelRequestedAt": "2025-06-15T09:30:00Z",
            "createdAt": "2025-06-14T08:00:00",
            "orderItems": [
                {"medicine": {"id": 12, "name": "Napa"}, "qty": 2, "medicinePrice": 10.5},
                {"medicineId": 13, "medicineName": "Ace", "quantity": 1, "unitPrice": 5, "lineTotal": 4.5}
            ],
            "customerName": "Rahim",
            "customerPhone": ""
        }))
        .unwrap();

        assert_eq!(order.id, OrderId::new("101"));
        assert_eq!(order.user_id, UserId::new("9"));
        assert_eq!(order.status, OrderStatus::CancelRequested);
        assert_eq!(order.pre_cancel_status, Some(OrderStatus::Paid));
        assert_eq!(order.cancel_reason.as_deref(), Some("Ordered by mistake"));
        assert_eq!(order.lines[0].product_id, ProductId::new("12"));
        assert_eq!(order.lines[0].line_total, Money::new(2100));
        assert_eq!(order.lines[1].line_total, Money::new(450));
        assert_eq!(order.total_amount, Money::new(2550));
        assert_eq!(
            order.created_at,
            Some(Utc.with_ymd_and_hms(2025, 6, 14, 8, 0, 0).unwrap())
        );
        assert_eq!(order.customer.name.as_deref(), Some("Rahim"));
        assert_eq!(order.customer.phone, None);
    }

    #[test]
    fn test_order_total_prefers_server_value() {
        let order = order(&json!({
            "orderId": "5", "userId": 1, "total": "99.90",
            "items": [{"medicineId": 1, "quantity": 1, "price": 10}]
        }))
        .unwrap();
        assert_eq!(order.total_amount, Money::new(9990));
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.lines[0].name, UNKNOWN_MEDICINE);
    }

    #[test]
    fn test_unknown_status_is_malformed() {
        let raw = json!({"id": 1, "status": "SHIPPED"});
        assert!(matches!(order(&raw), Err(CommerceError::MalformedPayload(_))));

        let listed = orders(&json!([raw, {"id": 2, "status": "PAID"}])).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, OrderId::new("2"));
    }

    #[test]
    fn test_user_aliases() {
        let u = user(&json!({
            "userId": 4, "firstName": "Karim", "lastName": "Uddin",
            "username": "karim@example.com", "mobile": "0171", "role": "ROLE_ADMIN"
        }))
        .unwrap();
        assert_eq!(u.id, UserId::new("4"));
        assert_eq!(u.name, "Karim Uddin");
        assert_eq!(u.email, "karim@example.com");
        assert_eq!(u.phone.as_deref(), Some("0171"));
        assert_eq!(u.role, Role::Admin);

        let plain = user(&json!({"id": 5, "name": "Sumi", "email": "s@x", "role": "USER"})).unwrap();
        assert_eq!(plain.role, Role::Customer);
    }

    #[test]
    fn test_overview_and_top_selling() {
        let o = overview(&json!({
            "totalRevenue": 1500.5, "total_profit": "300.25", "totalUnitsSold": 42,
            "totalOrders": 10, "pendingOrders": 3, "deliveredOrders": 6, "cancelledOrders": 1
        }))
        .unwrap();
        assert_eq!(o.total_revenue, Money::new(150050));
        assert_eq!(o.total_profit, Money::new(30025));
        assert_eq!(o.total_units_sold, 42);
        assert_eq!(o.cancelled_orders, 1);
        assert!(overview(&json!([])).is_err());

        let rows = top_selling(&json!([{"medicineName": "Napa", "totalQty": 30, "totalRevenue": 300}])).unwrap();
        assert_eq!(rows[0].medicine_name, "Napa");
        assert_eq!(rows[0].total_qty, 30);
        assert_eq!(rows[0].total_revenue, Money::new(30000));
    }

    #[test]
    fn test_timestamp_forms() {
        let expected = Utc.with_ymd_and_hms(2025, 6, 15, 0, 0, 0).unwrap();
        assert_eq!(timestamp(&json!("2025-06-15")), Some(expected));
        assert_eq!(timestamp(&json!("2025-06-15T06:00:00+06:00")), Some(expected));
        assert_eq!(timestamp(&json!(expected.timestamp_millis())), Some(expected));
        assert_eq!(timestamp(&json!("yesterday")), None);
    }

    #[test]
    fn test_snake_case() {
        assert_eq!(snake_case("discountStart"), "discount_start");
        assert_eq!(snake_case("id"), "id");
    }
}
