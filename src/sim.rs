//! Demo, benchmark, and stress runners that host customers and staff.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use rand::Rng;

use crate::config::ShopConfig;
use crate::error::ShopError;
use crate::mixer::{Mixer, PaintMixer};
use crate::shop::PaintShop;
use crate::tints::TintSet;
use crate::types::{NO_TINT, Order, OrderId, StaffId, TintId};

// Demo sizing (small for quick CLI feedback).
const DEMO_CUSTOMERS: usize = 4;
const DEMO_ORDERS_PER_CUSTOMER: usize = 3;
const DEMO_STAFF: usize = 3;
const DEMO_WORK_MS: u64 = 20;
// Go-home orders get ids above any regular order.
const GO_HOME_ID_BASE: OrderId = 1 << 32;

/// Best-effort CPU user/system time snapshot (seconds) on Unix platforms.
#[cfg(unix)]
fn cpu_times_seconds() -> Option<(f64, f64)> {
    // SAFETY: rusage is plain old data and getrusage only writes into it.
    let mut usage: libc::rusage = unsafe { std::mem::zeroed() };
    let rc = unsafe { libc::getrusage(libc::RUSAGE_SELF, &mut usage) };
    if rc != 0 {
        return None;
    }
    let seconds = |tv: libc::timeval| tv.tv_sec as f64 + tv.tv_usec as f64 / 1_000_000.0;
    Some((seconds(usage.ru_utime), seconds(usage.ru_stime)))
}

/// Stub on non-Unix platforms.
#[cfg(not(unix))]
fn cpu_times_seconds() -> Option<(f64, f64)> {
    None
}

/// Per-tint occupancy counters (index 1..=tints; index 0 unused).
struct TintMetrics {
    in_use: AtomicUsize,
    max_in_use: AtomicUsize,
    violation: AtomicBool,
    per_tint: Vec<AtomicUsize>,
}

impl TintMetrics {
    fn new(tints: usize) -> Self {
        Self {
            in_use: AtomicUsize::new(0),
            max_in_use: AtomicUsize::new(0),
            violation: AtomicBool::new(false),
            per_tint: (0..=tints).map(|_| AtomicUsize::new(0)).collect(),
        }
    }

    fn enter(&self, tint: TintId) {
        let index = tint as usize;
        debug_assert!(index < self.per_tint.len(), "tint index out of range");
        if self.per_tint[index].fetch_add(1, Ordering::SeqCst) > 0 {
            self.violation.store(true, Ordering::SeqCst);
        }
        let current = self.in_use.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_use.fetch_max(current, Ordering::SeqCst);
        if current > self.per_tint.len() - 1 {
            self.violation.store(true, Ordering::SeqCst);
        }
    }

    fn exit(&self, tint: TintId) {
        let prev = self.per_tint[tint as usize].fetch_sub(1, Ordering::SeqCst);
        debug_assert!(prev > 0, "tint counter underflow");
        let prev = self.in_use.fetch_sub(1, Ordering::SeqCst);
        debug_assert!(prev > 0, "in-use counter underflow");
    }

    fn max_in_use(&self) -> usize {
        self.max_in_use.load(Ordering::SeqCst)
    }

    fn has_violation(&self) -> bool {
        self.violation.load(Ordering::SeqCst)
    }
}

/// Wraps the paint mixer with exclusivity checks on every held tint.
struct InstrumentedMixer {
    inner: PaintMixer,
    metrics: TintMetrics,
}

impl Mixer for InstrumentedMixer {
    fn mix(&self, order: &Order, held: &TintSet, staff: StaffId) {
        for &tint in held.as_slice() {
            self.metrics.enter(tint);
        }
        self.inner.mix(order, held, staff);
        for &tint in held.as_slice() {
            self.metrics.exit(tint);
        }
    }
}

/// Random tint list: `complexity` entries from `0..=tints`, repeats allowed.
fn random_tints(rng: &mut impl Rng, config: &ShopConfig) -> Vec<TintId> {
    (0..config.paint_complexity)
        .map(|_| rng.gen_range(0..=config.tints as TintId))
        .collect()
}

/// Whether the can holds exactly the order's requested tints.
fn filled_correctly(order: &Order) -> bool {
    let can = order.can();
    let expected: Vec<TintId> = order
        .requested_tints()
        .iter()
        .copied()
        .filter(|&tint| tint != NO_TINT)
        .collect();
    can.mixed_by.is_some() && can.contents == expected
}

/// Aggregated metrics from one shop run.
struct ShopRun {
    customers: usize,
    orders_per_customer: usize,
    staff: usize,
    tints: usize,
    total_orders: usize,
    elapsed_ms: f64,
    throughput: f64,
    avg_turnaround_us: f64,
    cpu_user_s: Option<f64>,
    cpu_sys_s: Option<f64>,
    orders_per_staff: Vec<usize>,
    max_tints_in_use: usize,
    tint_violation: bool,
    mismatched_returns: usize,
    shop_closed: bool,
}

impl ShopRun {
    const CSV_HEADER: &'static str = "customers,orders_per_customer,staff,tints,total_orders,elapsed_ms,throughput_orders_per_s,avg_turnaround_us,cpu_user_s,cpu_sys_s,max_tints_in_use,tint_violation,mismatched_returns";

    fn csv_row(&self) -> String {
        let fmt_cpu = |v: Option<f64>| v.map(|v| format!("{v:.4}")).unwrap_or_else(|| "NA".to_string());
        format!(
            "{},{},{},{},{},{:.2},{:.2},{:.2},{},{},{},{},{}",
            self.customers,
            self.orders_per_customer,
            self.staff,
            self.tints,
            self.total_orders,
            self.elapsed_ms,
            self.throughput,
            self.avg_turnaround_us,
            fmt_cpu(self.cpu_user_s),
            fmt_cpu(self.cpu_sys_s),
            self.max_tints_in_use,
            self.tint_violation,
            self.mismatched_returns
        )
    }

    fn report_violations(&self) {
        if self.tint_violation {
            eprintln!("# violation,tint_exclusivity");
        }
        if self.mismatched_returns > 0 {
            eprintln!("# violation,mismatched_returns,{}", self.mismatched_returns);
        }
    }
}

fn run_shop(
    customers: usize,
    orders_per_customer: usize,
    staff: usize,
    config: ShopConfig,
    work_ms: u64,
) -> Result<ShopRun, ShopError> {
    debug_assert!(customers > 0, "customers must be > 0");
    debug_assert!(staff > 0, "staff must be > 0");
    let shop = Arc::new(PaintShop::open(config)?);
    let mixer = Arc::new(InstrumentedMixer {
        inner: PaintMixer::new(Duration::from_millis(work_ms)),
        metrics: TintMetrics::new(config.tints),
    });
    let mismatched = Arc::new(AtomicUsize::new(0));
    let turnaround_us = Arc::new(AtomicU64::new(0));

    let cpu_start = cpu_times_seconds();
    let start = Instant::now();

    let mut staff_handles = Vec::with_capacity(staff);
    for staff_id in 0..staff {
        let shop = Arc::clone(&shop);
        let mixer = Arc::clone(&mixer);
        let handle = thread::Builder::new()
            .name(format!("staff-{staff_id}"))
            .spawn(move || shop.work_shift(mixer.as_ref(), staff_id as StaffId))
            .expect("failed to spawn staff thread");
        staff_handles.push(handle);
    }

    let mut customer_handles = Vec::with_capacity(customers);
    for customer_id in 0..customers {
        let shop = Arc::clone(&shop);
        let mismatched = Arc::clone(&mismatched);
        let turnaround_us = Arc::clone(&turnaround_us);
        let handle = thread::Builder::new()
            .name(format!("customer-{customer_id}"))
            .spawn(move || {
                let mut rng = rand::thread_rng();
                for n in 0..orders_per_customer {
                    let id = (customer_id * orders_per_customer + n) as OrderId;
                    let order = Arc::new(Order::new(id, &random_tints(&mut rng, shop.config())));
                    let submitted = Instant::now();
                    shop.order_paint(&order);
                    turnaround_us.fetch_add(submitted.elapsed().as_micros() as u64, Ordering::SeqCst);
                    if !filled_correctly(&order) {
                        mismatched.fetch_add(1, Ordering::SeqCst);
                    }
                }
            })
            .expect("failed to spawn customer thread");
        customer_handles.push(handle);
    }

    for handle in customer_handles {
        handle.join().expect("customer thread panicked");
    }
    // Everyone has their paint; send each staff member home.
    for n in 0..staff {
        shop.order_paint(&Arc::new(Order::go_home(GO_HOME_ID_BASE + n as OrderId)));
    }
    let orders_per_staff: Vec<usize> = staff_handles
        .into_iter()
        .map(|handle| handle.join().expect("staff thread panicked"))
        .collect();

    let elapsed_ms = start.elapsed().as_millis() as f64;
    let total_orders = customers * orders_per_customer;
    let throughput = if elapsed_ms > 0.0 {
        total_orders as f64 / (elapsed_ms / 1000.0)
    } else {
        0.0
    };
    let avg_turnaround_us = if total_orders > 0 {
        turnaround_us.load(Ordering::SeqCst) as f64 / total_orders as f64
    } else {
        0.0
    };
    let (cpu_user_s, cpu_sys_s) = match (cpu_start, cpu_times_seconds()) {
        (Some((user_start, sys_start)), Some((user_end, sys_end))) => {
            (Some(user_end - user_start), Some(sys_end - sys_start))
        }
        _ => (None, None),
    };

    let shop_closed = shop.is_closed();
    let run = ShopRun {
        customers,
        orders_per_customer,
        staff,
        tints: config.tints,
        total_orders,
        elapsed_ms,
        throughput,
        avg_turnaround_us,
        cpu_user_s,
        cpu_sys_s,
        orders_per_staff,
        max_tints_in_use: mixer.metrics.max_in_use(),
        tint_violation: mixer.metrics.has_violation(),
        mismatched_returns: mismatched.load(Ordering::SeqCst),
        shop_closed,
    };
    match Arc::try_unwrap(shop) {
        Ok(shop) => shop.close(),
        Err(_) => warn!("[SHOP] still shared after every thread joined, skipping close"),
    }
    Ok(run)
}

/// Run the default demo: a few customers, a few staff, one shop.
pub fn run_demo() {
    info!("[DEMO] start");
    let config = ShopConfig::default();
    let run = match run_shop(
        DEMO_CUSTOMERS,
        DEMO_ORDERS_PER_CUSTOMER,
        DEMO_STAFF,
        config,
        DEMO_WORK_MS,
    ) {
        Ok(run) => run,
        Err(err) => {
            eprintln!("demo error: {err}");
            return;
        }
    };
    debug!("[DEMO] finished in {:.0}ms", run.elapsed_ms);

    println!("DEMO SUMMARY");
    println!(
        "customers={} staff={} orders_total={}",
        run.customers, run.staff, run.total_orders
    );
    println!("orders_per_staff={:?}", run.orders_per_staff);
    println!("max_tints_in_use={}", run.max_tints_in_use);
    println!("tint_violation={}", run.tint_violation);
    println!("mismatched_returns={}", run.mismatched_returns);
    println!("shop_closed={}", run.shop_closed);
}

/// Knobs for a single benchmark run; `None` keeps the default.
#[derive(Clone, Copy, Debug, Default)]
pub struct BenchParams {
    pub customers: Option<usize>,
    pub orders_per_customer: Option<usize>,
    pub staff: Option<usize>,
    pub tints: Option<usize>,
    pub work_ms: Option<u64>,
    pub validate: bool,
}

/// Run a single benchmark and print one CSV row.
pub fn run_benchmark(params: BenchParams) {
    let customers = params.customers.unwrap_or(8);
    let orders_per_customer = params.orders_per_customer.unwrap_or(25);
    let staff = params.staff.unwrap_or(4);
    let tints = params.tints.unwrap_or(ShopConfig::default().tints);
    let work_ms = params.work_ms.unwrap_or(2);

    let config = ShopConfig::default().with_tints(tints);
    match run_shop(customers, orders_per_customer, staff, config, work_ms) {
        Ok(run) => {
            println!("{}", ShopRun::CSV_HEADER);
            println!("{}", run.csv_row());
            if params.validate {
                run.report_violations();
            }
        }
        Err(err) => eprintln!("benchmark error: {err}"),
    }
}

/// Sets swept by the stress runner; `None` keeps the defaults.
#[derive(Clone, Debug, Default)]
pub struct StressParams {
    pub customer_sets: Option<Vec<usize>>,
    pub staff_sets: Option<Vec<usize>>,
    pub tint_sets: Option<Vec<usize>>,
    pub work_ms: Option<u64>,
    pub validate: bool,
}

/// Sweep customer x staff x tint configurations and print CSV output.
pub fn run_stress(params: StressParams) {
    let customer_sets = params.customer_sets.unwrap_or_else(|| vec![1, 4, 16]);
    let staff_sets = params.staff_sets.unwrap_or_else(|| vec![1, 2, 4, 8]);
    let tint_sets = params.tint_sets.unwrap_or_else(|| vec![3, 10]);
    let work_ms = params.work_ms.unwrap_or(1);
    let orders_per_customer = 20;

    println!("{}", ShopRun::CSV_HEADER);
    for &customers in &customer_sets {
        for &staff in &staff_sets {
            for &tints in &tint_sets {
                let config = ShopConfig::default().with_tints(tints);
                match run_shop(customers, orders_per_customer, staff, config, work_ms) {
                    Ok(run) => {
                        println!("{}", run.csv_row());
                        if params.validate {
                            run.report_violations();
                        }
                    }
                    Err(err) => eprintln!("# error,{customers},{staff},{tints},{err}"),
                }
            }
        }
    }
}
