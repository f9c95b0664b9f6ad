//! Performance benchmarks for the payroll engine.
//!
//! This benchmark suite covers:
//! - Single payslip composition
//! - Payslip preview through the HTTP API
//! - Payroll run creation for growing employee counts
//!
//! Run with: `cargo bench`
//! HTML reports are generated in `target/criterion/`

use std::str::FromStr;
use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use payroll_engine::api::{create_router, AppState};
use payroll_engine::config::ConfigLoader;
use payroll_engine::models::{
    AttendanceRecord, CompensationProfile, Cutoff, DaySchedule, EmployeeRecord, EmploymentStatus,
    SalaryType, ScheduleProfile, WeeklySchedule,
};
use payroll_engine::payroll::{
    Collaborators, InMemoryAttendanceStore, InMemoryCostLedger, InMemoryEmployeeDirectory,
    InMemoryPayrollRepository, PayrollService, RunParameters,
};

use axum::{body::Body, http::Request};
use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use tower::ServiceExt;

fn office_schedule() -> ScheduleProfile {
    let work = DaySchedule {
        time_in: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
        time_out: NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
        is_workday: true,
    };
    let rest = DaySchedule {
        is_workday: false,
        ..work
    };
    ScheduleProfile {
        weekly: WeeklySchedule {
            monday: work,
            tuesday: work,
            wednesday: work,
            thursday: work,
            friday: work,
            saturday: rest,
            sunday: rest,
        },
        overrides: vec![],
    }
}

/// Creates a service with `employee_count` employees, each with a full
/// cutoff of attendance and a few late days.
fn create_test_service(employee_count: usize) -> PayrollService {
    let config = ConfigLoader::load("./config/default").expect("Failed to load config");
    let directory = InMemoryEmployeeDirectory::new();
    let attendance = InMemoryAttendanceStore::new();
    let cutoff = create_cutoff();

    for i in 0..employee_count {
        let id = format!("emp_bench_{:04}", i);
        let (salary_type, basic) = match i % 3 {
            0 => (SalaryType::Monthly, "25000"),
            1 => (SalaryType::Daily, "700"),
            _ => (SalaryType::Hourly, "95"),
        };
        directory.upsert(EmployeeRecord {
            id: id.clone(),
            name: format!("Bench Employee {}", i),
            department: None,
            status: EmploymentStatus::Active,
            compensation: Some(CompensationProfile {
                salary_type,
                basic_salary: Decimal::from_str(basic).unwrap(),
                allowance: Some(Decimal::from(2000)),
            }),
            schedule: Some(office_schedule()),
        });

        for (n, date) in cutoff.dates().enumerate() {
            let clock_in = NaiveTime::from_hms_opt(8, (n % 4 * 5) as u32, 0).unwrap();
            attendance.add_record(
                &id,
                AttendanceRecord::present(date, clock_in, NaiveTime::from_hms_opt(17, 0, 0).unwrap()),
            );
        }
    }

    let collaborators = Collaborators {
        employees: Arc::new(directory),
        attendance: Arc::new(attendance),
        contributions: Arc::new(config.config().contributions().clone()),
        ledger: Arc::new(InMemoryCostLedger::new()),
        repository: Arc::new(InMemoryPayrollRepository::new()),
    };
    PayrollService::from_config(collaborators, config.config())
}

fn create_cutoff() -> Cutoff {
    Cutoff::new(
        NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
        NaiveDate::from_ymd_opt(2026, 1, 15).unwrap(),
    )
    .unwrap()
}

fn create_params(employee_count: usize) -> RunParameters {
    RunParameters::new(
        "org_bench",
        create_cutoff(),
        (0..employee_count)
            .map(|i| format!("emp_bench_{:04}", i))
            .collect(),
    )
}

/// Benchmark: One payslip preview, no I/O beyond the in-memory stores.
fn bench_single_preview(c: &mut Criterion) {
    let service = create_test_service(1);
    let params = create_params(1);

    c.bench_function("single_preview", |b| {
        b.iter(|| {
            black_box(
                service
                    .preview_employee_payroll("emp_bench_0000", &params)
                    .unwrap(),
            )
        })
    });
}

/// Benchmark: One payslip preview through the router.
fn bench_api_preview(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let router = create_router(AppState::new(create_test_service(1)));
    let body = serde_json::json!({
        "employee_id": "emp_bench_0000",
        "cutoff_start": "2026-01-01",
        "cutoff_end": "2026-01-15"
    })
    .to_string();

    c.bench_function("api_preview", |b| {
        b.to_async(&rt).iter(|| async {
            let router = router.clone();
            let response = router
                .oneshot(
                    Request::builder()
                        .method("POST")
                        .uri("/payroll/preview")
                        .header("Content-Type", "application/json")
                        .body(Body::from(body.clone()))
                        .unwrap(),
                )
                .await
                .unwrap();
            black_box(response)
        })
    });
}

/// Benchmark: Run creation as the employee count grows.
fn bench_run_creation(c: &mut Criterion) {
    let mut group = c.benchmark_group("run_creation");
    group.sample_size(10);

    for employee_count in [10usize, 100, 1000] {
        let service = create_test_service(employee_count);
        let params = create_params(employee_count);

        group.throughput(Throughput::Elements(employee_count as u64));
        group.bench_with_input(
            BenchmarkId::new("employees", employee_count),
            &employee_count,
            |b, _| b.iter(|| black_box(service.create_payroll_run(params.clone()).unwrap())),
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_single_preview,
    bench_api_preview,
    bench_run_creation,
);
criterion_main!(benches);
