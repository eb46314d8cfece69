// ============================================================================
// Settlement Engine
// Monthly allocation of production to consumers, banking and lapse
// ============================================================================

use super::remaining::{HasRemaining, RemainingCapacityView};
use crate::domain::{
    AllocationRecord, BankedBalance, BankingAllocationRecord, BankingUsage, ConsumerSelection,
    ConsumptionUnit, LapseAllocationRecord, ManualOverride, MonthKey, Period, PeriodQuantities,
    ProducerGroup, ProductionUnit, SettlementConfig, ShareholdingRecord, ShareholdingTable, SiteId,
};
use crate::error::SettlementResult;
use crate::interfaces::{PeriodPairing, SettlementEvent, SettlementEventHandler};
use crate::numeric::Quantity;
use crate::validation::{order_consumers, validate_input};
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Arc;
use uuid::Uuid;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

// ============================================================================
// Input / Output
// ============================================================================

/// Everything one settlement run reads. The engine never mutates it.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SettlementInput {
    pub month: MonthKey,
    pub production: Vec<ProductionUnit>,
    pub consumption: Vec<ConsumptionUnit>,
    pub banked: Vec<BankedBalance>,
    pub shareholdings: Vec<ShareholdingRecord>,
    pub selection: ConsumerSelection,
    pub overrides: Vec<ManualOverride>,
}

impl SettlementInput {
    pub fn new(month: MonthKey) -> Self {
        Self {
            month,
            production: Vec::new(),
            consumption: Vec::new(),
            banked: Vec::new(),
            shareholdings: Vec::new(),
            selection: ConsumerSelection::default(),
            overrides: Vec::new(),
        }
    }

    pub fn with_production(mut self, unit: ProductionUnit) -> Self {
        self.production.push(unit);
        self
    }

    pub fn with_consumption(mut self, unit: ConsumptionUnit) -> Self {
        self.consumption.push(unit);
        self
    }

    pub fn with_banked(mut self, balance: BankedBalance) -> Self {
        self.banked.push(balance);
        self
    }

    pub fn with_shareholding(mut self, record: ShareholdingRecord) -> Self {
        self.shareholdings.push(record);
        self
    }

    pub fn with_selection(mut self, selection: ConsumerSelection) -> Self {
        self.selection = selection;
        self
    }

    pub fn with_override(mut self, pinned: ManualOverride) -> Self {
        self.overrides.push(pinned);
        self
    }
}

/// Result of one settlement run
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SettlementOutcome {
    pub run_id: Uuid,
    pub month: MonthKey,
    /// One record per (production, consumption) pair with a nonzero period,
    /// sorted by production site then consumption site
    pub allocations: Vec<AllocationRecord>,
    pub banking: Vec<BankingAllocationRecord>,
    pub lapses: Vec<LapseAllocationRecord>,
    pub banking_usage: Vec<BankingUsage>,
    /// Unscaled quantity each producer delivered to consumers
    pub delivered: BTreeMap<SiteId, PeriodQuantities>,
    pub residual: RemainingCapacityView,
}

impl SettlementOutcome {
    pub fn allocation(&self, production: &str, consumption: &str) -> Option<&AllocationRecord> {
        self.allocations.iter().find(|a| {
            a.production_site.as_str() == production && a.consumption_site.as_str() == consumption
        })
    }

    pub fn banking_for(&self, production: &str) -> Option<&BankingAllocationRecord> {
        self.banking
            .iter()
            .find(|b| b.production_site.as_str() == production)
    }

    pub fn lapse_for(&self, production: &str) -> Option<&LapseAllocationRecord> {
        self.lapses
            .iter()
            .find(|l| l.production_site.as_str() == production)
    }

    /// Credited quantity a consumer received in `period`, over all producers
    pub fn credited_to(&self, consumption: &str, period: Period) -> Quantity {
        self.allocations
            .iter()
            .filter(|a| a.consumption_site.as_str() == consumption)
            .map(|a| a.allocated[period])
            .sum()
    }

    /// True if some consumer demand was left unmatched
    pub fn has_residue(&self) -> bool {
        self.residual.unmatched_consumers().next().is_some()
    }
}

// ============================================================================
// Engine
// ============================================================================

/// Monthly settlement engine with pluggable period pairing
pub struct SettlementEngine {
    config: SettlementConfig,

    /// Which demand periods each supply period may serve
    pairing: Box<dyn PeriodPairing>,

    /// Event handler for processing events
    event_handler: Arc<dyn SettlementEventHandler>,
}

impl SettlementEngine {
    /// Create a new settlement engine
    pub fn new(
        config: SettlementConfig,
        pairing: Box<dyn PeriodPairing>,
        event_handler: Arc<dyn SettlementEventHandler>,
    ) -> Self {
        Self {
            config,
            pairing,
            event_handler,
        }
    }

    pub fn config(&self) -> &SettlementConfig {
        &self.config
    }

    pub fn pairing_name(&self) -> &str {
        self.pairing.name()
    }

    /// Settle one month.
    ///
    /// Fails only on malformed input; nothing is produced in that case.
    /// Unmatched demand or supply is reported through `residual`.
    pub fn settle(&self, input: &SettlementInput) -> SettlementResult<SettlementOutcome> {
        validate_input(input)?;
        let shares = ShareholdingTable::from_records(&input.shareholdings)?;
        let consumers = order_consumers(&input.consumption, &input.selection);

        let run_id = Uuid::new_v4();
        tracing::info!(
            settlement = %self.config.name,
            %run_id,
            month = %input.month,
            producers = input.production.len(),
            consumers = consumers.len(),
            pairing = self.pairing.name(),
            "settlement run started"
        );

        let mut run = SettlementRun {
            engine: self,
            run_id,
            month: input.month,
            view: RemainingCapacityView::new(&input.production, &consumers, &input.banked, input.month),
            shares,
            overrides: &input.overrides,
            allocations: BTreeMap::new(),
            banking: BTreeMap::new(),
            lapses: BTreeMap::new(),
            usage: Vec::new(),
            delivered: BTreeMap::new(),
            events: vec![SettlementEvent::RunStarted {
                run_id,
                month: input.month,
                timestamp: Utc::now(),
            }],
        };

        for period in Period::SETTLEMENT_ORDER {
            run.settle_period(period);
        }

        Ok(run.finish())
    }
}

// ============================================================================
// Single Run
// ============================================================================

struct SettlementRun<'a> {
    engine: &'a SettlementEngine,
    run_id: Uuid,
    month: MonthKey,
    view: RemainingCapacityView,
    shares: ShareholdingTable,
    overrides: &'a [ManualOverride],
    allocations: BTreeMap<(SiteId, SiteId), AllocationRecord>,
    banking: BTreeMap<SiteId, BankingAllocationRecord>,
    lapses: BTreeMap<SiteId, LapseAllocationRecord>,
    usage: Vec<BankingUsage>,
    delivered: BTreeMap<SiteId, PeriodQuantities>,
    events: Vec<SettlementEvent>,
}

impl SettlementRun<'_> {
    fn settle_period(&mut self, period: Period) {
        let demand_periods = self.engine.pairing.demand_periods(period);
        let has_demand = self.view.any_demand_in(&demand_periods);

        if has_demand {
            self.apply_overrides(period);
        } else {
            tracing::debug!(run_id = %self.run_id, %period, "no remaining demand, matching skipped");
        }

        for group in ProducerGroup::PRECEDENCE {
            let members = self.group_members(group);
            if members.is_empty() {
                continue;
            }

            if has_demand {
                for &producer in &members {
                    for &demand_period in &demand_periods {
                        for consumer in 0..self.view.consumption.len() {
                            if self.view.production[producer].remaining[period] == 0 {
                                break;
                            }
                            self.match_pair(producer, consumer, period, demand_period, None);
                        }
                    }
                }
            }

            self.resolve_leftovers(&members, period);
        }

        // Banks cover same-period demand only. Other demand periods may still
        // have fresh production of their own to settle.
        if self.view.any_demand_in(&[period]) {
            self.draw_from_banks(period, &[period]);
        }
    }

    fn group_members(&self, group: ProducerGroup) -> Vec<usize> {
        self.view
            .production
            .iter()
            .enumerate()
            .filter(|(_, p)| p.group() == group)
            .map(|(i, _)| i)
            .collect()
    }

    /// Pinned allocations go before greedy matching of their period
    fn apply_overrides(&mut self, period: Period) {
        let overrides = self.overrides;
        for pinned in overrides.iter().filter(|o| o.period == period) {
            let producer = self
                .view
                .production
                .iter()
                .position(|p| p.site_id == pinned.production_site);
            let consumer = self
                .view
                .consumption
                .iter()
                .position(|c| c.site_id == pinned.consumption_site);
            let (Some(producer), Some(consumer)) = (producer, consumer) else {
                continue;
            };

            let applied = self.match_pair(producer, consumer, period, period, Some(pinned.quantity));
            if applied < pinned.quantity {
                tracing::warn!(
                    run_id = %self.run_id,
                    production_site = %pinned.production_site,
                    consumption_site = %pinned.consumption_site,
                    %period,
                    requested = pinned.quantity,
                    applied,
                    "manual override clamped to available quantity"
                );
                self.events.push(SettlementEvent::OverrideClamped {
                    run_id: self.run_id,
                    production_site: pinned.production_site.clone(),
                    consumption_site: pinned.consumption_site.clone(),
                    period,
                    requested: pinned.quantity,
                    applied,
                });
            }
        }
    }

    /// Match one producer against one consumer. Returns the unscaled quantity
    /// moved, zero if nothing was recorded.
    fn match_pair(
        &mut self,
        producer: usize,
        consumer: usize,
        supply_period: Period,
        demand_period: Period,
        cap: Option<Quantity>,
    ) -> Quantity {
        if !Period::is_compatible(supply_period, demand_period) {
            return 0;
        }

        let prod = &mut self.view.production[producer];
        let cons = &mut self.view.consumption[consumer];

        let mut matched = prod.remaining[supply_period].min(cons.remaining[demand_period]);
        if let Some(cap) = cap {
            matched = matched.min(cap);
        }
        if matched <= 0 {
            return 0;
        }

        let credited = self.shares.scale(matched, &prod.company_id, &cons.company_id);
        if credited == 0 {
            tracing::debug!(
                run_id = %self.run_id,
                production_site = %prod.site_id,
                consumption_site = %cons.site_id,
                matched,
                "match scaled to zero, discarded"
            );
            return 0;
        }

        // Physical bookkeeping is unscaled
        prod.remaining[supply_period] -= matched;
        cons.remaining[demand_period] -= matched;

        self.delivered
            .entry(prod.site_id.clone())
            .or_default()
            .add(supply_period, matched);

        let month = self.month;
        let record = self
            .allocations
            .entry((prod.site_id.clone(), cons.site_id.clone()))
            .or_insert_with(|| {
                AllocationRecord::new(
                    prod.site_id.clone(),
                    prod.company_id.clone(),
                    cons.site_id.clone(),
                    cons.company_id.clone(),
                    month,
                )
            });
        record.allocated.add(demand_period, credited);

        tracing::debug!(
            run_id = %self.run_id,
            production_site = %prod.site_id,
            consumption_site = %cons.site_id,
            %supply_period,
            %demand_period,
            matched,
            credited,
            "matched"
        );

        if self.engine.config.emit_match_events {
            self.events.push(SettlementEvent::Matched {
                run_id: self.run_id,
                production_site: prod.site_id.clone(),
                consumption_site: cons.site_id.clone(),
                supply_period,
                demand_period,
                matched,
                credited,
            });
        }

        matched
    }

    /// Whatever a group could not place is banked or lapsed
    fn resolve_leftovers(&mut self, members: &[usize], period: Period) {
        for &index in members {
            let producer = &mut self.view.production[index];
            let leftover = producer.remaining[period];
            if leftover <= 0 {
                continue;
            }
            producer.remaining[period] = 0;

            let site = producer.site_id.clone();
            let company = producer.company_id.clone();
            let month = self.month;

            if producer.banking_enabled {
                self.banking
                    .entry(site.clone())
                    .or_insert_with(|| BankingAllocationRecord::new(site.clone(), company, month))
                    .quantities
                    .add(period, leftover);
                self.events.push(SettlementEvent::Banked {
                    run_id: self.run_id,
                    production_site: site,
                    period,
                    quantity: leftover,
                });
            } else {
                self.lapses
                    .entry(site.clone())
                    .or_insert_with(|| LapseAllocationRecord::new(site.clone(), company, month))
                    .quantities
                    .add(period, leftover);
                self.events.push(SettlementEvent::Lapsed {
                    run_id: self.run_id,
                    production_site: site,
                    period,
                    quantity: leftover,
                });
            }
        }
    }

    /// Consumers still short after all producers draw on banked balances
    fn draw_from_banks(&mut self, period: Period, demand_periods: &[Period]) {
        for &demand_period in demand_periods {
            for consumer in 0..self.view.consumption.len() {
                for bank in 0..self.view.banked.len() {
                    let cons = &mut self.view.consumption[consumer];
                    let balance = &mut self.view.banked[bank];

                    if cons.remaining[demand_period] == 0 {
                        break;
                    }
                    if !balance.drawable || balance.remaining[period] == 0 {
                        continue;
                    }

                    let drawn = balance.remaining[period].min(cons.remaining[demand_period]);
                    let credited = self.shares.scale(drawn, &balance.company_id, &cons.company_id);
                    if credited == 0 {
                        continue;
                    }

                    balance.remaining[period] -= drawn;
                    cons.remaining[demand_period] -= drawn;

                    tracing::debug!(
                        run_id = %self.run_id,
                        banked_site = %balance.site_id,
                        consumption_site = %cons.site_id,
                        %period,
                        drawn,
                        credited,
                        "drew from bank"
                    );

                    self.usage.push(BankingUsage {
                        banked_site: balance.site_id.clone(),
                        consumption_site: cons.site_id.clone(),
                        supply_period: period,
                        demand_period,
                        quantity: -credited,
                        drawn,
                    });
                    self.events.push(SettlementEvent::BankDrawn {
                        run_id: self.run_id,
                        banked_site: balance.site_id.clone(),
                        consumption_site: cons.site_id.clone(),
                        period: demand_period,
                        drawn,
                        credited,
                    });
                }
            }
        }
    }

    fn finish(mut self) -> SettlementOutcome {
        for consumer in self.view.unmatched_consumers() {
            for (period, remaining) in consumer.remaining().iter().filter(|(_, q)| *q > 0) {
                if self.engine.config.warn_on_residue {
                    tracing::warn!(
                        run_id = %self.run_id,
                        consumption_site = %consumer.site_id,
                        %period,
                        remaining,
                        "demand left unmatched"
                    );
                }
                self.events.push(SettlementEvent::DemandUnmatched {
                    run_id: self.run_id,
                    consumption_site: consumer.site_id.clone(),
                    period,
                    remaining,
                });
            }
        }

        let allocations: Vec<AllocationRecord> = self
            .allocations
            .into_values()
            .filter(|a| !a.allocated.is_zero())
            .collect();

        tracing::info!(
            run_id = %self.run_id,
            month = %self.month,
            allocations = allocations.len(),
            banked = self.banking.len(),
            lapsed = self.lapses.len(),
            bank_draws = self.usage.len(),
            "settlement run completed"
        );

        self.events.push(SettlementEvent::RunCompleted {
            run_id: self.run_id,
            month: self.month,
            allocations: allocations.len(),
            timestamp: Utc::now(),
        });
        self.engine.event_handler.on_events(self.events);

        SettlementOutcome {
            run_id: self.run_id,
            month: self.month,
            allocations,
            banking: self.banking.into_values().collect(),
            lapses: self.lapses.into_values().collect(),
            banking_usage: self.usage,
            delivered: self.delivered,
            residual: self.view,
        }
    }
}
