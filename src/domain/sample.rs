use super::row::RawRow;

/// Kenya 2023 example used to pre-fill the indicator form. Carries the
/// descriptive columns of the source dataset alongside the model inputs.
pub fn sample_row() -> RawRow {
    let descriptive = RawRow::new()
        .with("Country", "Kenya")
        .with("Reported number of people receiving ART", 1_200_000.0)
        .with("Estimated number of people living with HIV", 1_400_000.0)
        .with("Estimated ART coverage among people living with HIV (%)", 85.0)
        .with("Estimated number of people living with HIV_median", 1_380_000.0)
        .with("Estimated number of people living with HIV_min", 1_350_000.0)
        .with("Estimated number of people living with HIV_max", 1_450_000.0)
        .with("Estimated ART coverage among people living with HIV (%)_median", 84.5)
        .with("Estimated ART coverage among people living with HIV (%)_min", 82.0)
        .with("Estimated ART coverage among people living with HIV (%)_max", 86.0)
        .with("WHO Region", "AFRO")
        .with("iso2", "KE")
        .with("iso3", "KEN")
        .with("iso_numeric", 404.0)
        .with("g_whoregion", "AFRO")
        .with("year", 2023.0);

    const INDICATORS: &[(&str, f64)] = &[
        ("rep_meth", 1.0),
        ("new_sp_coh", 1000.0),
        ("new_sp_cur", 980.0),
        ("new_sp_cmplt", 950.0),
        ("new_sp_died", 30.0),
        ("new_sp_fail", 10.0),
        ("new_sp_def", 10.0),
        ("c_new_sp_tsr", 95.0),
        ("new_snep_coh", 800.0),
        ("new_snep_cmplt", 760.0),
        ("new_snep_died", 20.0),
        ("new_snep_fail", 10.0),
        ("new_snep_def", 10.0),
        ("c_new_snep_tsr", 95.0),
        ("ret_coh", 900.0),
        ("ret_cur", 870.0),
        ("ret_cmplt", 10.0),
        ("ret_died", 10.0),
        ("ret_fail", 10.0),
        ("ret_def", 950.0),
        ("hiv_new_sp_coh", 940.0),
        ("hiv_new_sp_cur", 920.0),
        ("hiv_new_sp_cmplt", 10.0),
        ("hiv_new_sp_died", 5.0),
        ("hiv_new_sp_fail", 5.0),
        ("hiv_new_sp_def", 0.0),
        ("hiv_new_snep_coh", 800.0),
        ("hiv_new_snep_cmplt", 780.0),
        ("hiv_new_snep_died", 10.0),
        ("hiv_new_snep_fail", 5.0),
        ("hiv_new_snep_def", 5.0),
        ("hiv_ret_coh", 700.0),
        ("hiv_ret_cur", 680.0),
        ("hiv_ret_cmplt", 10.0),
        ("hiv_ret_died", 5.0),
        ("hiv_ret_fail", 5.0),
        ("hiv_ret_def", 1.0),
        ("rel_with_new_flg", 500.0),
        ("newrel_coh", 450.0),
        ("newrel_succ", 20.0),
        ("newrel_fail", 10.0),
        ("newrel_died", 20.0),
        ("newrel_lost", 90.0),
        ("c_new_tsr", 450.0),
        ("ret_nrel_coh", 420.0),
        ("ret_nrel_succ", 10.0),
        ("ret_nrel_fail", 10.0),
        ("ret_nrel_died", 10.0),
        ("ret_nrel_lost", 90.0),
        ("c_ret_tsr", 400.0),
        ("tbhiv_coh", 370.0),
        ("tbhiv_succ", 10.0),
        ("tbhiv_fail", 10.0),
        ("tbhiv_died", 10.0),
        ("tbhiv_lost", 85.0),
        ("c_tbhiv_tsr", 300.0),
        ("mdr_coh", 270.0),
        ("mdr_succ", 10.0),
        ("mdr_fail", 10.0),
        ("mdr_died", 10.0),
        ("mdr_lost", 5.0),
        ("xdr_coh", 0.0),
        ("xdr_succ", 0.0),
        ("xdr_fail", 0.0),
        ("xdr_died", 0.0),
        ("xdr_lost", 0.0),
        ("Unnamed: 72", 0.0),
    ];

    INDICATORS
        .iter()
        .fold(descriptive, |row, (name, value)| row.with(*name, *value))
}
