//! 月度 BOQ 重新預測示例

use boq_planner::*;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::json;

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    println!("=== 月度 BOQ 重新預測示例 ===\n");

    // 外部 ML 流程產生的月度計劃
    let plan: MonthlyPlan = serde_json::from_value(json!({
        "project_id": "PG-765KV-LINE-07",
        "total_months": 4,
        "generated_on": "2025-03-01",
        "breakdown": [
            { "month": 1, "materials": { "Cement_MT": 500, "Tower_Steel_MT": 220, "ACSR_Moose_tons": 0 } },
            { "month": 2, "materials": { "Cement_MT": 300, "Tower_Steel_MT": 180, "ACSR_Moose_tons": 35 } },
            { "month": 3, "materials": { "Cement_MT": 200, "Tower_Steel_MT": 120, "ACSR_Moose_tons": 60 } },
            { "month": 4, "materials": { "Cement_MT": 100, "Tower_Steel_MT": 40, "ACSR_Moose_tons": 45 } }
        ]
    }))?;

    let mut repository = InMemoryPlanRepository::new();
    repository.insert(plan);
    let service = ForecastService::new(repository, ForecastConfig::default())?;

    // 每月回報的耗用增量
    let mut ledger = ConsumptionLedger::new();
    let reported_on = NaiveDate::from_ymd_opt(2025, 5, 2).ok_or("無效日期")?;
    ledger.record(1, MaterialId::parse("Cement_MT")?, Decimal::from(420), reported_on)?;
    ledger.record(2, MaterialId::parse("Cement_MT")?, Decimal::from(220), reported_on)?;
    ledger.record(1, MaterialId::parse("Tower_Steel_MT")?, Decimal::from(260), reported_on)?;
    ledger.record(2, MaterialId::parse("Tower_Steel_MT")?, Decimal::from(190), reported_on)?;

    let request = ForecastRequest::new(2, ledger.cumulative_through(2)?);
    let response = service.forecast("PG-765KV-LINE-07", &request)?;

    println!("第 {} 月重新預測:", response.next_month);
    for record in &response.forecast {
        println!(
            "  - {}: 原計劃 {}, 預測 {}, PF {:.2}, 剩餘 {}",
            record.material,
            record.planned_next_before,
            record.forecast_next,
            record.progress_factor,
            record.remaining_boq
        );
    }

    let inventory = InventorySnapshot::new("PG-765KV-LINE-07".to_string())
        .with_item("cement mt", Decimal::from(150))
        .with_item("Tower Steel", Decimal::from(40));

    println!("\n庫存沖銷:");
    let lines = service.procurement_for_next_month("PG-765KV-LINE-07", &request, &inventory)?;
    for line in &lines {
        match line.status {
            ProcurementStatus::Sufficient => {
                println!("  - {}: 庫存足夠，不需下單", line.material)
            }
            ProcurementStatus::OrderRequired => {
                println!("  - {}: 需下單 {}", line.material, line.to_order)
            }
            ProcurementStatus::NoInventoryRecord => {
                println!("  - {}: 無庫存資料，需下單 {}", line.material, line.to_order)
            }
        }
    }

    // 尚未產生計劃的專案
    if let Err(err) = service.forecast("PG-400KV-SS-02", &request) {
        println!("\n{} ({})", err.user_message(), err.status_code());
    }

    Ok(())
}
