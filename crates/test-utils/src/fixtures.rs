//! Small datasets used across the test suite.
//!
//! The drainage and land-surface fixtures share a coordinate system so the
//! subbasin workflow can be exercised end to end:
//!
//! - `DRAINAGE_3X3_R2C`: 3x3 cells of 1 degree from (0, 0); ranks 1..9 in
//!   file order, every cell drains to rank 9, which is the outlet.
//! - `LSS_2X2_R2C`: 2x2 cells of 1.5 degrees from (-0.1, -0.1) with two
//!   land-cover classes.
//! - `GAUGES_TB0`: two gauges, at cell (1, 1) (rank 5) and cell (0, 2)
//!   (rank 7) of the drainage grid.

/// Attribute `DA` over a 2x3 grid with values `x + 10 * y`.
pub const DA_2X3_R2C: &str = "\
########################################
:FileType r2c ASCII EnSim 1.0
#
# DataType 2D Rect Cell
#
:Projection LATLONG
:Ellipsoid SPHERE
#
:xOrigin -100.0
:yOrigin 45.0
#
:AttributeName 1 DA
:AttributeType 1 float
:AttributeUnits 1 km2
#
:xCount 2
:yCount 3
:xDelta 0.5
:yDelta 0.25
#
:EndHeader
0 1
10 11
20 21
";

/// Drainage database over a 3x3 grid where every cell drains to rank 9.
pub const DRAINAGE_3X3_R2C: &str = "\
########################################
:FileType r2c ASCII EnSim 1.0
#
:Application test-utils
#
:NominalGridSize_AL 1000
:ContourInterval 1
:ImperviousArea 0
:ClassCount 2
:NumRiverClasses 1
:ElevConversion 1
:TotalNumOfGrids 9
:NumGridsInBasin 8
:DebugGridNo 8
#
:Projection LATLONG
:Ellipsoid SPHERE
#
:xOrigin 0.0
:yOrigin 0.0
#
:AttributeName 1 Rank
:AttributeType 1 integer
:AttributeName 2 Next
:AttributeType 2 integer
:AttributeName 3 DA
:AttributeUnits 3 km2
:AttributeName 4 ChnlSlope
:AttributeName 5 ChnlLength
:AttributeUnits 5 m
:AttributeName 6 IAK
:AttributeType 6 integer
:AttributeName 7 GridArea
:AttributeUnits 7 m2
:AttributeName 8 forest
:AttributeName 9 crop
#
:xCount 3
:yCount 3
:xDelta 1.0
:yDelta 1.0
:EndHeader
1 2 3
4 5 6
7 8 9
9 9 9
9 9 9
9 9 0
1 1 1
1 1 1
1 1 9
0.01 0.01 0.01
0.01 0.01 0.01
0.01 0.01 0.01
1000 1000 1000
1000 1000 1000
1000 1000 1000
1 1 1
1 1 1
1 1 1
1000000 1000000 1000000
1000000 1000000 1000000
1000000 1000000 1000000
0.5 0.5 0.5
0.5 0.5 0.5
0.5 0.5 0.5
0.5 0.5 0.5
0.5 0.5 0.5
0.5 0.5 0.5
";

/// Land-surface domain over a 2x2 grid with classes `forest` and `crop`.
pub const LSS_2X2_R2C: &str = "\
:FileType r2c ASCII EnSim 1.0
:ClassCount 2
:TotalNumOfGrids 4
:Projection LATLONG
:Ellipsoid SPHERE
:xOrigin -0.1
:yOrigin -0.1
:AttributeName 1 Rank
:AttributeName 2 Next
:AttributeName 3 GridArea
:AttributeName 4 forest
:AttributeName 5 crop
:xCount 2
:yCount 2
:xDelta 1.5
:yDelta 1.5
:EndHeader
1 2
3 4
4 4
4 0
1 1
1 1
1.0 0.0
0.5 0.25
0.0 1.0
0.5 0.75
";

/// Streamflow table with two gauges located on the 3x3 drainage grid.
pub const GAUGES_TB0: &str = "\
########################################
:FileType tb0 ASCII EnSim 1.0
#
:StartTime 2004/01/01 00:00:00.000
:DeltaT 1
:RoutingDeltaT 1
#
:FillFlag n
#
:Projection LATLONG
:Ellipsoid SPHERE
#
:ColumnMetaData
:ColumnName 05AA001 \"Bow River\"
:ColumnType float float
:ColumnUnits m3/s m3/s
:ColumnLocationX 1.5 0.2
:ColumnLocationY 1.5 2.7
:EndColumnMetaData
#
:EndHeader
 1.0 2.0
 -1 3.5
 4.25 5
";

/// Multi-frame dataset of one attribute over a 2x2 grid, three hourly frames.
pub const RAIN_MULTI_FRAME_R2C: &str = "\
:FileType r2c ASCII EnSim 1.0
:Projection LATLONG
:Ellipsoid SPHERE
:xOrigin 0.0
:yOrigin 0.0
:AttributeName RN
:AttributeUnits mm
:xCount 2
:yCount 2
:xDelta 1.0
:yDelta 1.0
:EndHeader
:Frame 1 1 \"2010/07/01 00:00:00.000\"
0 0
0 0
:EndFrame
:Frame 2 2 \"2010/07/01 01:00:00.000\"
1 2
3 4
:EndFrame
:Frame 3 3 \"2010/07/01 02:00:00.000\"
2 4
6 8
:EndFrame
";
