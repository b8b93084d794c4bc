use crate::dataset::{compose_date, Dataset, Incident};
use crate::models::*;

/// A small dataset in the layout of the source file.
///
/// * Three incidents in Philadelphia, one with `nperps` of -99.
/// * One each in Trenton and New York.
/// * Three in Paris: one without coordinates and one without a date.
/// * One with an unknown city, dropped while loading.
const TEST_CSV: &str = "\
eventid,iyear,imonth,iday,country_txt,region_txt,city,latitude,longitude,nperps,nkill,nwound
201503010001,2015,3,1,United States,North America,Philadelphia,39.75,-74.75,2,1,2
201607040001,2016,7,4,United States,North America,Philadelphia,40.0,-74.5,4,2,2
201506150001,2015,6,15,United States,North America,Philadelphia,39.5,-74.25,-99,,-99
201503200001,2015,3,20,United States,North America,Trenton,39.25,-73.5,1,0,0
201506010001,2015,6,1,United States,North America,New York,40.75,-73.875,Unknown,1,5
201607140001,2016,7,14,France,Western Europe,Paris,48.875,2.375,3,10,20
201607010001,2016,7,1,France,Western Europe,Paris,,,1,0,1
201600000001,0,0,0,France,Western Europe,Paris,48.75,2.25,-99,0,0
201501010001,2015,1,1,France,Western Europe,Unknown,45.0,5.0,1,1,1
";

/// Load the test dataset.
pub(crate) fn get_test_dataset() -> Dataset {
    let (dataset, _) = Dataset::from_reader(TEST_CSV.as_bytes()).unwrap();
    dataset
}

/// Create an Incident with only location and date set.
pub(crate) fn incident(
    region: &str,
    country: &str,
    city: &str,
    coordinates: Option<(f64, f64)>,
    (iyear, imonth, iday): (i32, i32, i32),
) -> Incident {
    let iday = if iday == 0 { 1 } else { iday };
    Incident {
        eventid: Some(format!("{region}/{country}/{city}/{iyear}-{imonth}-{iday}")),
        region: region.to_string(),
        country: country.to_string(),
        city: city.to_string(),
        latitude: coordinates.map(|(latitude, _)| latitude),
        longitude: coordinates.map(|(_, longitude)| longitude),
        iyear,
        imonth,
        iday,
        nkill: None,
        nwound: None,
        nperps: None,
        date: compose_date(iyear, imonth, iday),
    }
}

/// Create a DataRequest object for a box around Philadelphia at city zoom.
pub(crate) fn get_test_data_request() -> DataRequest {
    DataRequest {
        bounds: Some(Bounds {
            north: Some(40.0),
            south: Some(39.0),
            east: Some(-73.0),
            west: Some(-75.0),
        }),
        zoom: Some(6.0),
    }
}

/// Create a TimelineRequest object with a date range.
pub(crate) fn get_test_timeline_request(start: &str, end: &str) -> TimelineRequest {
    TimelineRequest {
        filters: Some(TimelineFilters {
            date_range: Some(vec![start.to_string(), end.to_string()]),
        }),
    }
}
